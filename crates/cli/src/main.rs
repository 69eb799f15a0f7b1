//! CLI tool for converting plain text into PowerPoint slides.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use slides_core::{
    Config, ContentGenerator, DocumentConverter, OutputTarget, SlideProcessor, SourceText,
};
use slides_gemini::GeminiClient;
use slides_pandoc::{PandocBootstrap, PandocConverter};
use slides_pptx::DeckInspector;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// SlidesGPT - Convert plain text to presentation slides.
#[derive(Parser, Debug)]
#[command(name = "slidesgpt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate presentation slides from text input
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Input file path
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Direct text input
    #[arg(short, long)]
    text: Option<String>,

    /// Output file path (will be saved as .pptx)
    #[arg(short, long)]
    output: PathBuf,

    /// Log the Gemini models available to the API key
    #[arg(long)]
    list_models: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Generate(args) => match generate(&args) {
            Ok(target) => {
                println!(
                    "Successfully generated presentation at: {}",
                    target.deck_path().display()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Error during generation: {:#}", e);
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// Run the `generate` subcommand.
fn generate(args: &GenerateArgs) -> Result<OutputTarget> {
    // Checked before any file or network access.
    let source = SourceText::from_args(args.input.clone(), args.text.clone())?;

    let mut config = Config::load().context("Failed to load configuration")?;
    if args.list_models {
        config = config.with_list_models(true);
    }

    generate_with(&source, &args.output, &config)
}

/// Generate a deck from `source` with an already loaded configuration.
fn generate_with(source: &SourceText, output: &Path, config: &Config) -> Result<OutputTarget> {
    let target = OutputTarget::new(output);
    let gemini = GeminiClient::new(config)?;

    // Read the input before pandoc is located, which may download it.
    let content = match source {
        SourceText::File(path) => source
            .load()
            .with_context(|| format!("Failed to read {}", path.display()))?,
        SourceText::Inline(_) => source.load()?,
    };

    let pandoc = PandocBootstrap::from_config(config)?.ensure_available()?;
    let processor =
        SlideProcessor::new(PandocConverter::new(pandoc).with_template(&config.template));

    run_pipeline(&content, &gemini, &processor, &target)?;
    report_deck(&target);

    Ok(target)
}

/// Generate markdown for `content` and convert it into `target`.
fn run_pipeline<G, C>(
    content: &str,
    generator: &G,
    processor: &SlideProcessor<C>,
    target: &OutputTarget,
) -> Result<()>
where
    G: ContentGenerator,
    C: DocumentConverter,
{
    let markdown = generator.generate(content)?;

    if !processor.process(&markdown, target.deck_path()) {
        bail!("Failed to generate valid presentation content");
    }

    Ok(())
}

/// Log what ended up in the deck.
fn report_deck(target: &OutputTarget) {
    match DeckInspector::new().inspect(target.deck_path()) {
        Ok(summary) => log::info!(
            "Generated {} slides: {}",
            summary.slide_count(),
            summary.titles().join(" | ")
        ),
        Err(e) => log::warn!("Could not inspect {}: {}", target.deck_path().display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slides_core::Error;

    const DECK: &str = "# Hello\n## Slide1\n- point\n---\n## Thank You\n- bye\n";

    struct CannedGenerator(&'static str);

    impl ContentGenerator for CannedGenerator {
        fn generate(&self, _text: &str) -> slides_core::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    impl ContentGenerator for FailingGenerator {
        fn generate(&self, _text: &str) -> slides_core::Result<String> {
            Err(Error::RemoteService("quota exceeded".to_string()))
        }
    }

    struct TouchConverter;

    impl DocumentConverter for TouchConverter {
        fn convert(&self, _markdown_file: &Path, output_file: &Path) -> slides_core::Result<()> {
            std::fs::write(output_file, b"PK")?;
            Ok(())
        }
    }

    fn parse(args: &[&str]) -> GenerateArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Generate(args) => args,
        }
    }

    #[test]
    fn test_parse_generate_args() {
        let args = parse(&["slidesgpt", "generate", "-t", "Hello World", "-o", "deck.txt"]);
        assert_eq!(args.text.as_deref(), Some("Hello World"));
        assert_eq!(args.output, PathBuf::from("deck.txt"));
        assert!(args.input.is_none());
    }

    #[test]
    fn test_output_is_required() {
        assert!(Cli::try_parse_from(["slidesgpt", "generate", "-t", "x"]).is_err());
    }

    #[test]
    fn test_missing_source_reported_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("deck.pptx");
        let args = parse(&["slidesgpt", "generate", "-o", output.to_str().unwrap()]);

        let err = generate(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingSource)
        ));
        assert_eq!(
            err.to_string(),
            "Either --input or --text must be provided"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unreadable_input_reported_before_pandoc_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let install_dir = dir.path().join("pandoc");
        let config = Config::default()
            .with_api_key("test-key")
            .with_pandoc(dir.path().join("no-such-pandoc"))
            .with_pandoc_install_dir(&install_dir);
        let source = SourceText::File(dir.path().join("missing.txt"));

        let err = generate_with(&source, &dir.path().join("deck.pptx"), &config).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
        assert!(!install_dir.exists());
        assert!(!dir.path().join("deck.md").exists());
    }

    #[test]
    fn test_pipeline_writes_deck_and_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::new(dir.path().join("deck.txt"));
        let processor = SlideProcessor::new(TouchConverter);

        run_pipeline("Hello World", &CannedGenerator(DECK), &processor, &target).unwrap();

        assert_eq!(target.deck_path(), dir.path().join("deck.pptx"));
        assert!(dir.path().join("deck.pptx").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("deck.md")).unwrap(),
            DECK
        );
    }

    #[test]
    fn test_pipeline_rejects_empty_generation() {
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::new(dir.path().join("deck.pptx"));
        let processor = SlideProcessor::new(TouchConverter);

        let err = run_pipeline("Hello World", &CannedGenerator(""), &processor, &target)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to generate valid presentation content"
        );
        assert!(!dir.path().join("deck.md").exists());
        assert!(!dir.path().join("deck.pptx").exists());
    }

    #[test]
    fn test_pipeline_surfaces_remote_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::new(dir.path().join("deck.pptx"));
        let processor = SlideProcessor::new(TouchConverter);

        let err = run_pipeline("Hello World", &FailingGenerator, &processor, &target)
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert!(!dir.path().join("deck.md").exists());
    }
}
