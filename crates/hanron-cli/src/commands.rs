/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: a debate submission
    Say(String),
    Register { email: String, password: String },
    Login { email: String, password: String },
    Logout,
    Threads,
    /// `/switch <n|id>`: list position (1-based) or thread id
    Switch(ThreadRef),
    New,
    Delete(ThreadRef),
    History,
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadRef {
    Index(usize),
    Id(String),
}

impl ThreadRef {
    fn parse(arg: &str) -> Self {
        match arg.parse::<usize>() {
            Ok(n) if n > 0 => ThreadRef::Index(n),
            _ => ThreadRef::Id(arg.to_string()),
        }
    }
}

pub const HELP: &str = "\
Type a claim to debate it. The first message of a thread fixes its topic.

  /register <email> <password>   create an account and sign in
  /login <email> <password>      sign in
  /logout                        sign out (threads are kept)
  /threads                       list your threads
  /switch <n|id>                 continue a thread
  /new                           start a new thread
  /delete <n|id>                 delete a thread
  /history                       show the current thread
  /reset                         clear the current thread and its topic
  /help                          show this help
  /quit                          exit";

/// Parse a trimmed, non-empty input line
pub fn parse(line: &str) -> Result<Command, String> {
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Say(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let credentials = |usage: &str| match args.as_slice() {
        [email, password] => Ok((email.to_string(), password.to_string())),
        _ => Err(format!("usage: {}", usage)),
    };
    let thread_ref = |usage: &str| match args.as_slice() {
        [arg] => Ok(ThreadRef::parse(arg)),
        _ => Err(format!("usage: {}", usage)),
    };

    match name {
        "register" => {
            let (email, password) = credentials("/register <email> <password>")?;
            Ok(Command::Register { email, password })
        }
        "login" => {
            let (email, password) = credentials("/login <email> <password>")?;
            Ok(Command::Login { email, password })
        }
        "logout" => Ok(Command::Logout),
        "threads" => Ok(Command::Threads),
        "switch" => thread_ref("/switch <n|id>").map(Command::Switch),
        "new" => Ok(Command::New),
        "delete" => thread_ref("/delete <n|id>").map(Command::Delete),
        "history" => Ok(Command::History),
        "reset" => Ok(Command::Reset),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command /{} (try /help)", other)),
    }
}
