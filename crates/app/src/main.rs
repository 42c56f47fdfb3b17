use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use quiz_core::model::{Choice, ProgressLedger, QuizItem};
use services::{
    ChatLog, ChatModelClient, ChatService, ContextRef, Difficulty, GenerateQuizRequest,
    PromptLibrary, QuizLoopService, QuizSession, ReviewService, SessionError,
};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLevel { raw: String },
    InvalidCount { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLevel { raw } => write!(f, "invalid --level value: {raw}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    prompts_path: String,
    level: Difficulty,
    count: u32,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--prompts <file>] [--level <easy|medium|hard>] [--count <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --prompts prompts_study_buddy.txt");
    eprintln!("  --level easy");
    eprintln!("  --count 5");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_AI_API_KEY, STUDY_AI_BASE_URL, STUDY_AI_MODEL, STUDY_PROMPTS_FILE");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut prompts_path = std::env::var("STUDY_PROMPTS_FILE")
            .unwrap_or_else(|_| "prompts_study_buddy.txt".into());
        let mut level = Difficulty::Easy;
        let mut count = 5;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--prompts" => {
                    prompts_path = require_value(args, "--prompts")?;
                }
                "--level" => {
                    let value = require_value(args, "--level")?;
                    level = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLevel { raw: value.clone() })?;
                }
                "--count" => {
                    let value = require_value(args, "--count")?;
                    count = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCount { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            prompts_path,
            level,
            count,
        })
    }
}

fn print_help() {
    println!("Commands:");
    println!("  quiz <topic>    generate a quiz about the topic");
    println!("  answer <A-D>    submit an answer for the current question");
    println!("  reveal          show the correct answer and explanation");
    println!("  next            move on to the next question");
    println!("  progress        show attempt totals and accuracy");
    println!("  chat <message>  ask the study buddy a question");
    println!("  attach <uri>    reference uploaded study material by uri");
    println!("  review          recap the questions you missed");
    println!("  restart         drop the current quiz (progress is kept)");
    println!("  quit            exit");
}

fn print_question(session: &QuizSession) {
    let progress = session.progress();
    let Some(item) = session.current_item() else {
        return;
    };
    println!(
        "Question {} / {}: {}",
        session.current_index() + 1,
        progress.total,
        item.question
    );
    for (i, option) in item.options.iter().enumerate() {
        let letter = char::from(b'A' + i as u8);
        println!("  {letter}. {option}");
    }
}

fn print_reveal(item: &QuizItem) {
    if let Ok(correct) = item.correct_choice() {
        let text = item.option(correct).unwrap_or_default();
        println!("Correct answer: {correct}. {text}");
    }
    if item.explanation.is_empty() {
        println!("No explanation provided.");
    } else {
        println!("Explanation: {}", item.explanation);
    }
}

fn print_progress(ledger: &ProgressLedger) {
    println!(
        "Attempts: {}  Correct: {}  Accuracy: {:.1}%",
        ledger.total_attempts(),
        ledger.total_correct(),
        ledger.accuracy()
    );
    let recent = ledger.recent_summary(5);
    if !recent.is_empty() {
        let marks: Vec<String> = recent
            .iter()
            .map(|o| format!("{} ({})", if o.correct { "ok" } else { "x" }, o.level))
            .collect();
        println!("Last {}: {}", recent.len(), marks.join(", "));
    }
}

/// The session controller: owns the active quiz session and the progress
/// ledger and threads them through every command.
struct Controller {
    loop_svc: QuizLoopService,
    chat_svc: ChatService,
    review_svc: ReviewService,
    level: Difficulty,
    count: u32,
    session: Option<QuizSession>,
    ledger: ProgressLedger,
    chat_log: ChatLog,
    context: Vec<ContextRef>,
    last_topic: String,
}

impl Controller {
    async fn start_quiz(&mut self, topic: &str) {
        if topic.trim().is_empty() {
            println!("Give me a topic: quiz <topic>");
            return;
        }
        self.last_topic = topic.trim().to_owned();
        let request = GenerateQuizRequest::new(topic)
            .with_level(self.level)
            .with_items(self.count)
            .with_context(self.context.clone());

        println!("Generating a {} quiz about {topic}...", self.level);
        match self.loop_svc.generate_quiz(&request).await {
            Ok(quiz) if quiz.is_empty() => {
                // Degenerate but recoverable: warn, don't fail.
                println!("The model produced an empty quiz. Try generating again.");
            }
            Ok(quiz) => match self.loop_svc.begin(quiz) {
                Ok(session) => {
                    println!("Quiz ready: {} ({})", session.topic(), session.level());
                    print_question(&session);
                    self.session = Some(session);
                }
                Err(err) => println!("Could not start the quiz: {err}"),
            },
            Err(err) => println!("Quiz generation failed: {err}"),
        }
    }

    fn answer(&mut self, letter: &str) {
        let Some(session) = self.session.as_mut() else {
            println!("No active quiz. Start one with: quiz <topic>");
            return;
        };
        let choice = Choice::from_letter(letter).ok();
        match self
            .loop_svc
            .answer_current(session, &mut self.ledger, choice)
        {
            Ok(graded) => {
                if graded.correct {
                    println!("Correct!");
                } else {
                    println!("Not quite.");
                }
                println!("Type `reveal` for the explanation, then `next` to continue.");
            }
            Err(SessionError::NoSelection) => {
                println!("Pick one of A, B, C or D: answer <letter>");
            }
            Err(err) => println!("{err}"),
        }
    }

    fn reveal(&mut self) {
        let Some(session) = self.session.as_mut() else {
            println!("No active quiz.");
            return;
        };
        match session.reveal() {
            Ok(item) => print_reveal(item),
            Err(err) => println!("{err}"),
        }
    }

    fn next(&mut self) {
        let Some(session) = self.session.as_mut() else {
            println!("No active quiz.");
            return;
        };
        match session.advance().map(|item| item.is_some()) {
            Ok(true) => print_question(session),
            Ok(false) => {
                println!("Quiz complete!");
                print_progress(&self.ledger);
            }
            Err(err) => println!("{err}"),
        }
    }

    async fn chat(&mut self, message: &str) {
        if message.trim().is_empty() {
            println!("Say something: chat <message>");
            return;
        }
        match self
            .chat_svc
            .reply(&mut self.chat_log, message, &self.context)
            .await
        {
            Ok(reply) => println!("{reply}"),
            Err(err) => println!("Chat failed: {err}"),
        }
    }

    async fn review(&mut self) {
        match self
            .review_svc
            .review(&self.ledger, &self.last_topic, &self.context)
            .await
        {
            Ok(Some(recap)) => println!("{recap}"),
            Ok(None) => println!("No missed questions yet. Finish a quiz first."),
            Err(err) => println!("Review failed: {err}"),
        }
    }

    fn attach(&mut self, rest: &str) {
        let (uri, name) = match rest.split_once(' ') {
            Some((uri, name)) => (uri, name.trim()),
            None => (rest, rest),
        };
        if uri.is_empty() {
            println!("Give me a reference: attach <uri> [name]");
            return;
        }
        self.context.push(ContextRef::new(uri, name));
        println!("Attached {name}. Future quizzes and chats will reference it.");
    }

    fn restart(&mut self) {
        // Drops the session; the ledger survives across quizzes.
        self.session = None;
        println!("Quiz discarded. Start a new one with: quiz <topic>");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let prompts = PromptLibrary::load(&args.prompts_path);
    if prompts.is_empty() {
        log::warn!(
            "no prompt sections loaded from {}; using bare prompts",
            args.prompts_path
        );
    }

    let model = ChatModelClient::from_env();
    if !model.enabled() {
        eprintln!("STUDY_AI_API_KEY is not set; model calls will fail until it is.");
    }
    let model: Arc<ChatModelClient> = Arc::new(model);

    let mut controller = Controller {
        loop_svc: QuizLoopService::new(
            quiz_core::Clock::default_clock(),
            model.clone(),
            prompts.clone(),
        ),
        chat_svc: ChatService::new(model.clone(), prompts.clone()),
        review_svc: ReviewService::new(model, prompts),
        level: args.level,
        count: args.count,
        session: None,
        ledger: ProgressLedger::new(),
        chat_log: ChatLog::new(),
        context: Vec::new(),
        last_topic: String::new(),
    };

    println!("Study buddy ready. Type `help` for commands.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "help" => print_help(),
            "quiz" => controller.start_quiz(rest).await,
            "answer" => controller.answer(rest),
            "reveal" => controller.reveal(),
            "next" => controller.next(),
            "progress" => print_progress(&controller.ledger),
            "chat" => controller.chat(rest).await,
            "attach" => controller.attach(rest),
            "review" => controller.review().await,
            "restart" => controller.restart(),
            "quit" | "exit" => break,
            other => println!("Unknown command: {other}. Type `help` for commands."),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
