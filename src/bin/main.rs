use crossterm::style::Stylize;
use spellsync::{DictionaryConfig, DictionaryManager, SyncOutcome};
use std::io::{stdout, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Commands:
  <text>            check every word in the line
  suggest <word>    correction candidates
  add <word>        add a word to this device only
  propose <word>    propose a word for the shared dictionary
  clear             forget device-only words
  retry             download the dictionary again
  push              submit pending proposals now
  status            show dictionary state
  reset             delete the stored dictionary
  exit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DictionaryConfig::load(config_path.as_deref())?;
    let manager = DictionaryManager::new(&config)?;

    println!("{}", format!("Spell checker ({})", config.language).bold());
    println!("---------------------------------------------------------------");
    println!("{HELP}\n");

    // Startup sync runs in the background while the prompt is live.
    let _tasks = manager.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        let (command, arg) = match input.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (input, ""),
        };

        let result = match command {
            "" => Ok(()),
            "exit" => break,
            "help" => {
                println!("{HELP}");
                Ok(())
            }
            "suggest" => suggest(&manager, arg),
            "add" => manager.add_word_local(arg).await.map(|_| {
                println!("{} '{}' added to this device", "ok".green(), arg);
            }),
            "propose" => manager.add_word_global(arg).await.map(|_| {
                println!("{} '{}' queued for review", "ok".green(), arg);
            }),
            "clear" => manager.clear_local_dictionary().await.map(|_| {
                println!("{} local words cleared", "ok".green());
            }),
            "retry" => manager.retry_dictionary_download().await.map(report_outcome),
            "push" => manager.push_suggestions().await.map(|marked| {
                println!("{} {} suggestion(s) confirmed", "ok".green(), marked);
            }),
            "status" => {
                status(&manager);
                Ok(())
            }
            "reset" => manager.reset().await.map(|_| {
                println!("{} stored dictionary deleted", "ok".green());
            }),
            _ => check_line(&manager, input).await,
        };

        if let Err(e) = result {
            println!("{} {}", "error:".red().bold(), e);
        }
        prompt();
    }

    println!("\nBye.");
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = stdout().flush();
}

async fn check_line(manager: &DictionaryManager, line: &str) -> spellsync::Result<()> {
    let words: Vec<&str> = line
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();
    let unknown = manager.check_spellings(&words).await?;
    if unknown.is_empty() {
        println!("{}", "all words known".green());
        return Ok(());
    }
    for word in unknown {
        let correction = manager.suggest_corrections(&word)?;
        if correction.suggestions.is_empty() {
            println!("  {}  (no suggestions)", correction.wrong.as_str().red());
        } else {
            println!(
                "  {}  -> {}",
                correction.wrong.as_str().red(),
                correction.suggestions.join(", ")
            );
        }
    }
    Ok(())
}

fn suggest(manager: &DictionaryManager, word: &str) -> spellsync::Result<()> {
    let correction = manager.suggest_corrections(word)?;
    if correction.suggestions.is_empty() {
        println!("No suggestions found.");
    }
    for (i, suggestion) in correction.suggestions.iter().enumerate() {
        println!("  :{}: {}", i + 1, suggestion);
    }
    Ok(())
}

fn report_outcome(outcome: SyncOutcome) {
    match outcome {
        SyncOutcome::AlreadyRunning => println!("{}", "a download is already running".yellow()),
        SyncOutcome::UpToDate => println!("{} dictionary is up to date", "ok".green()),
        SyncOutcome::Updated { id } => println!("{} dictionary updated to version {}", "ok".green(), id),
        SyncOutcome::Failed => println!("{}", "download failed, keeping the current dictionary".yellow()),
    }
}

fn status(manager: &DictionaryManager) {
    match manager.snapshot() {
        Some(record) => {
            println!("Language:   {}", record.language);
            println!("Version:    {}", record.id);
            println!("Words:      {}", record.words.len());
            println!("Local:      {}", record.local_words.len());
            println!(
                "Proposals:  {} ({} pending)",
                record.global_suggestions.len(),
                manager.pending_suggestions()
            );
        }
        None => println!("{}", "No dictionary loaded yet.".yellow()),
    }
    if manager.dictionary_updating() {
        println!("{}", "Download in progress...".yellow());
    }
}
