// Terminal front end for the fitment selector.
//
// Reads FITMENT_* settings from the environment (or .env), loads the vehicle
// types, then takes commands on stdin:
//   type <value> | year <value> | make <value> | model <value> | submit | quit

use fitment_selector_lib::{
    telemetry, Field, FieldHandle, FieldKind, FitmentSelector, Handles, MemorySessionStore,
    Navigator, SelectorConfig, SubmitButton, SubmitHandle, SubmitOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader};

struct PrintField;

impl FieldHandle for PrintField {
    fn render(&mut self, field: &Field) {
        let state = if field.enabled { "enabled" } else { "disabled" };
        println!(
            "{:<6} [{}] value={:?} options={:?}",
            field.kind.label(),
            state,
            field.value().unwrap_or(""),
            field.option_values()
        );
    }
}

struct PrintSubmit;

impl SubmitHandle for PrintSubmit {
    fn render(&mut self, button: &SubmitButton) {
        let state = if button.enabled { "enabled" } else { "disabled" };
        println!("Submit [{}] {}", state, button.label);
    }
}

struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&mut self, url: &str) {
        println!("Navigate -> {}", url);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config = SelectorConfig::from_env()?;
    let handles = Handles {
        type_: Box::new(PrintField),
        year: Box::new(PrintField),
        make: Box::new(PrintField),
        model: Box::new(PrintField),
        submit: Box::new(PrintSubmit),
    };
    let mut selector = FitmentSelector::from_config(
        config,
        Box::new(MemorySessionStore::new()),
        Box::new(PrintNavigator),
        handles,
    )?;

    selector.connect();
    selector.settle().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, value) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "submit" => match selector.submit().await {
                Ok(SubmitOutcome::Navigated(_)) => break,
                Ok(SubmitOutcome::Reverted) => println!("Lookup failed, try again"),
                Err(e) => println!("{}", e),
            },
            other => match FieldKind::parse(other) {
                Some(kind) => {
                    if let Err(e) = selector.select(kind, value.trim()) {
                        println!("{}", e);
                    }
                    selector.settle().await;
                }
                None => println!("Unknown command: {}", other),
            },
        }
    }

    Ok(())
}
