use std::io::{self, BufRead, Write};

use taskmail::app::App;
use taskmail::command::Effect;
use taskmail::config::AppConfig;
use taskmail::sync;

/// Journal logger that keeps this crate at info/debug (per config) and
/// everything else at warn.
struct FilteredJournal {
    inner: systemd_journal_logger::JournalLog,
}

impl log::Log for FilteredJournal {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        if metadata.target().starts_with("taskmail") {
            let max = if taskmail::debug_logging() {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            };
            metadata.level() <= max
        } else {
            metadata.level() <= log::LevelFilter::Warn
        }
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Log to the systemd user journal (`journalctl --user -t taskmail -f`).
/// Without a journal the shell runs unlogged.
fn init_logging(debug: bool) {
    taskmail::set_debug_logging(debug);
    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("taskmail".to_string()),
        Err(e) => {
            eprintln!("Journal unavailable, logging disabled: {}", e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

/// `taskmail login`: store the IMAP password for the configured host.
fn login(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.imap.host.trim();
    if host.is_empty() {
        return Err("set imap.host in the config file first".into());
    }

    let stdin = io::stdin();
    let mut username = config.imap.username.trim().to_string();
    if username.is_empty() {
        print!("Username for {}: ", host);
        io::stdout().flush()?;
        stdin.lock().read_line(&mut username)?;
        username = username.trim().to_string();
    }
    print!("Password for {}@{}: ", username, host);
    io::stdout().flush()?;
    let mut password = String::new();
    stdin.lock().read_line(&mut password)?;

    sync::block_on(sync::keyring::store_credentials(host, &username, password.trim_end()))?;
    println!("Credentials stored.");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load();
    init_logging(config.debug_logging);

    if std::env::args().nth(1).as_deref() == Some("login") {
        return login(&config);
    }

    let mut app = App::load(config, chrono::Local::now().naive_local());
    println!("Hello! What can I do for you? Type 'help' to see the commands.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("{}> ", app.mode().prefix());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let reply = app.handle_line(&line, chrono::Local::now().naive_local());
        if let Some(response) = reply.outcome.response {
            println!("{}", response);
        }
        if reply.outcome.effect == Effect::Exit {
            break;
        }
    }

    app.save();
    log::logger().flush();
    Ok(())
}
