//! voxpoll main entry point
//!
//! Runs a survey in the terminal: each question is read aloud, the answer is
//! captured by the recognizer, and the filled-in answers are reviewed at the
//! end.

use anyhow::{bail, Context};
use log::{debug, error, info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use voxpoll::notify::ConsoleNotifier;
use voxpoll::platform::{event_channel, Platform};
use voxpoll::recognition::backends::console::ConsoleRecognizer;
use voxpoll::recognition::Recognizer;
use voxpoll::session::config::Config;
use voxpoll::session::phase::Phase;
use voxpoll::speech::create_synth;
use voxpoll::survey::load_questions;
use voxpoll::Session;

const USAGE: &str =
    "Usage: voxpoll [--debug] [--details] [--lang <language>] [--config <file>] <questions.json>";

/// Text inputs filled in by dictation before the questions, with their prompts
const DETAILS: [(&str, &str); 4] = [
    ("name", "Please say your name"),
    ("register_number", "Please say your register number"),
    ("college", "Please say your college"),
    ("location", "Please say your location"),
];

/// Command line options
struct Args {
    debug: bool,
    details: bool,
    lang: Option<String>,
    config: Option<PathBuf>,
    questions: PathBuf,
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let mut debug = false;
    let mut details = false;
    let mut lang = None;
    let mut config = None;
    let mut questions = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--debug" | "-d" => debug = true,
            "--details" => details = true,
            "--lang" | "-l" => {
                lang = Some(iter.next().context("--lang needs a value")?.clone());
            }
            "--config" | "-c" => {
                config = Some(PathBuf::from(iter.next().context("--config needs a value")?));
            }
            other if other.starts_with('-') => bail!("Unknown option {}\n{}", other, USAGE),
            other => {
                if questions.is_some() {
                    bail!("Only one question file may be given\n{}", USAGE);
                }
                questions = Some(PathBuf::from(other));
            }
        }
    }

    Ok(Args {
        debug,
        details,
        lang,
        config,
        questions: questions.context(USAGE)?,
    })
}

fn init_logging(debug_mode: bool) {
    if debug_mode {
        // Debug mode: write to voxpoll.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("voxpoll.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open voxpoll.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "voxpoll version {} starting (debug mode, logging to voxpoll.log)",
            voxpoll::VERSION
        );
    } else {
        // Normal mode: errors only unless RUST_LOG says otherwise
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Error)
            .parse_default_env()
            .init();
    }
}

fn main() {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    init_logging(args.debug);

    if let Err(e) = run(args) {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    debug!("Initializing voxpoll");

    let mut config = match &args.config {
        Some(path) => Config::load_from(path.clone()),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    if let Some(lang) = &args.lang {
        config.set("survey", "language", lang);
    }

    let questions = load_questions(&args.questions)
        .with_context(|| format!("Failed to load questions from {}", args.questions.display()))?;
    if questions.is_empty() {
        bail!("{} contains no questions", args.questions.display());
    }

    let (events, receiver) = event_channel();
    let synth = match create_synth(events.clone()) {
        Ok(synth) => Some(synth),
        Err(e) => {
            warn!("Speech synthesis unavailable: {}", e);
            None
        }
    };
    let recognizer: Box<dyn Recognizer> = Box::new(ConsoleRecognizer::new(events));
    let platform = Platform::new(
        synth,
        Some(recognizer),
        Box::new(ConsoleNotifier::new()),
        receiver,
    );

    let mut session = Session::new(config, platform, questions);

    println!("voxpoll {} ready", voxpoll::VERSION);
    println!("Configuration loaded: {}", session.config.path().display());
    println!("  Language: {}", session.locale());
    println!("  Questions: {}", session.questions().len());

    if args.details {
        collect_details(&mut session)?;
    }

    let questions = session.questions().to_vec();
    for (n, question) in questions.iter().enumerate() {
        println!();
        println!("Question {} of {}: {}", n + 1, questions.len(), question.text);
        for option in &question.options {
            println!("  - {}", option);
        }

        loop {
            session.speak_question(question)?;
            session.run_until_idle()?;

            let phase = session.phase(&question.id);
            if let Phase::Matched(option) = &phase {
                println!("Recorded: {}", option);
                break;
            }
            if !phase.is_terminal() {
                warn!("Question {} stopped while {}", question.id, phase);
                break;
            }
            debug!("Question {} ended {}", question.id, phase);
            if !confirm("Try again? [Y/n] ")? {
                break;
            }
        }
    }

    review(&mut session)
}

/// Dictate the respondent's details into the form's text inputs
fn collect_details(session: &mut Session) -> anyhow::Result<()> {
    println!();
    println!("Your details:");
    for (input_id, prompt) in DETAILS {
        println!("{}", prompt);
        session.ask_text_input(input_id, prompt)?;
        session.run_until_idle()?;
        match session.form().input(input_id) {
            Some(value) if !value.is_empty() => println!("Recorded: {}", value),
            _ => println!("(skipped)"),
        }
    }
    Ok(())
}

/// Print the answers and read a short summary aloud
fn review(session: &mut Session) -> anyhow::Result<()> {
    let answers = session.answers();
    println!();
    println!("Review:");
    for (input_id, _) in DETAILS {
        if let Some(value) = answers.get(input_id) {
            println!("  {}: {}", input_id.replace('_', " "), value);
        }
    }
    for question in session.questions() {
        let answer = answers
            .get(&question.id)
            .map(String::as_str)
            .unwrap_or("(no answer)");
        println!("  {}: {}", question.text, answer);
    }

    let answered = session
        .questions()
        .iter()
        .filter(|q| answers.contains_key(&q.id))
        .count();
    let summary = format!(
        "You answered {} of {} questions.",
        answered,
        session.questions().len()
    );
    println!("{}", summary);
    session.speak_text(&summary)?;
    session.run_until_idle()?;
    Ok(())
}

/// Ask a yes/no question on the terminal; empty input means yes
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(false);
    }
    let answer = line.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}
