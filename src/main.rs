// kaleido: Kaleidoscope front end with a stepping IR viewer

use std::fs;
use std::io;
use std::path::Path;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use inkwell::context::Context;
use ratatui::{backend::CrosstermBackend, Terminal};

use kaleido::constants::PROMPT;
use kaleido::driver::Driver;
use kaleido::parser::reader::ReaderChars;
use kaleido::ui::App;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let context = Context::create();
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("kaleido");

    // No file: interactive session on stdin, output on stderr
    let Some(input_file) = args.get(1) else {
        // The first token is read before the loop's own prompt
        eprint!("{}", PROMPT);
        let stdin = io::stdin();
        let mut driver = Driver::new(&context, ReaderChars::new(stdin.lock()));
        driver.run(&mut io::stderr())?;
        return Ok(());
    };

    if !Path::new(input_file).exists() {
        eprintln!("Error: File '{}' not found", input_file);
        eprintln!("Usage: {} [file.kal]", program_name);
        std::process::exit(1);
    }

    let source = fs::read_to_string(input_file)?;

    eprintln!("Compiling {}...", input_file);
    let mut driver = Driver::new(&context, source.chars()).with_history();
    driver.run(&mut io::sink())?;
    let (snapshots, transcript) = driver
        .into_history()
        .ok_or("session was not recorded")?;
    eprintln!("Recorded {} top-level units.", snapshots.len());

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(snapshots, transcript, source);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
