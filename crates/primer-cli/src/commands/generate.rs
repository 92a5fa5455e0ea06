//! Incremental generation command

use anyhow::Result;
use clap::Args;
use primer_catalog::{CatalogStorage, CatalogStore, FieldGroup};
use primer_gen::providers::{self, mock::MockProvider};
use primer_gen::{
    Capability, CredentialPools, GenerationRunner, Generators, ImageGenerator, PrimerConfig,
    PromptStyle, RunOptions, SeedList, SpeechGenerator, TextGenerator,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct GenerateArgs {
    /// Seed file (TOML or JSON); defaults to the built-in list
    #[arg(long)]
    pub seeds: Option<PathBuf>,

    /// Comma-separated field groups to generate (text, image, primary-audio, secondary-audio)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<FieldGroup>,

    /// Also fill in catalog entities that are not in the seed list
    #[arg(long)]
    pub include_unseeded: bool,

    /// Regenerate assets whose stored path points at a missing file
    #[arg(long)]
    pub verify_files: bool,

    /// Delay after each external call, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Text provider override
    #[arg(long)]
    pub text_provider: Option<String>,

    /// Image provider override
    #[arg(long)]
    pub image_provider: Option<String>,

    /// Speech provider override
    #[arg(long)]
    pub speech_provider: Option<String>,

    /// Prompt style name (searched in styles/ and .primer/styles/)
    #[arg(long)]
    pub style: Option<String>,
}

impl GenerateArgs {
    /// Selected groups in processing order
    fn groups(&self) -> Vec<FieldGroup> {
        if self.only.is_empty() {
            return FieldGroup::ALL.to_vec();
        }
        FieldGroup::ALL
            .into_iter()
            .filter(|g| self.only.contains(g))
            .collect()
    }
}

fn capability_for(group: FieldGroup) -> Capability {
    match group {
        FieldGroup::Text => Capability::Text,
        FieldGroup::Image => Capability::Image,
        FieldGroup::PrimaryAudio | FieldGroup::SecondaryAudio => Capability::Speech,
    }
}

pub fn run(mut config: PrimerConfig, args: GenerateArgs) -> Result<bool> {
    if let Some(name) = &args.text_provider {
        config.generation.text_provider = name.clone();
    }
    if let Some(name) = &args.image_provider {
        config.generation.image_provider = name.clone();
    }
    if let Some(name) = &args.speech_provider {
        config.generation.speech_provider = name.clone();
    }
    if let Some(ms) = args.delay_ms {
        config.generation.call_delay_ms = ms;
    }

    let groups = args.groups();
    let mut needed: Vec<Capability> = groups.iter().map(|g| capability_for(*g)).collect();
    needed.dedup();
    config.validate(&needed)?;

    let seeds = match &args.seeds {
        Some(path) => SeedList::load(path)?,
        None => SeedList::builtin(),
    };

    // Capabilities outside the selected groups are never called
    let text: Box<dyn TextGenerator> = if needed.contains(&Capability::Text) {
        providers::create_text_generator(&config)?
    } else {
        Box::new(MockProvider::new())
    };
    let image: Box<dyn ImageGenerator> = if needed.contains(&Capability::Image) {
        providers::create_image_generator(&config)?
    } else {
        Box::new(MockProvider::new())
    };
    let speech: Box<dyn SpeechGenerator> = if needed.contains(&Capability::Speech) {
        providers::create_speech_generator(&config)?
    } else {
        Box::new(MockProvider::new())
    };

    let mut options = RunOptions::from_config(&config);
    options.groups = groups;
    options.include_unseeded = args.include_unseeded;
    options.verify_files = args.verify_files;
    if let Some(name) = &args.style {
        options.prompts = options.prompts.with_style(PromptStyle::find(name)?);
    }

    let store = CatalogStore::new(config.catalog_path());
    println!(
        "Generating {} seed(s) into {}",
        seeds.len(),
        store.path().display()
    );
    for capability in &needed {
        println!("  {}: {}", capability, config.provider_for(*capability));
    }
    println!(
        "  Groups: {}",
        options
            .groups
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if options.call_delay > Duration::ZERO {
        println!("  Call delay: {}ms", options.call_delay.as_millis());
    }

    let generators = Generators {
        text: text.as_ref(),
        image: image.as_ref(),
        speech: speech.as_ref(),
    };
    let mut runner = GenerationRunner::new(
        &store,
        generators,
        CredentialPools::from_config(&config),
        options,
    )?;
    let summary = runner.run(&seeds)?;

    println!();
    print!("{}", summary);
    if summary.has_failures() {
        println!(
            "\n{} group(s) failed; run again to retry the missing fields.",
            summary.failed
        );
    }
    Ok(!summary.has_failures())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: GenerateArgs,
    }

    fn parse(argv: &[&str]) -> GenerateArgs {
        let mut full = vec!["primer"];
        full.extend_from_slice(argv);
        TestCli::try_parse_from(full).unwrap().args
    }

    #[test]
    fn test_groups_keep_processing_order() {
        let args = parse(&["--only", "secondary-audio,text"]);
        assert_eq!(
            args.groups(),
            vec![FieldGroup::Text, FieldGroup::SecondaryAudio]
        );
        assert_eq!(parse(&[]).groups(), FieldGroup::ALL.to_vec());
    }

    #[test]
    fn test_unknown_group_rejected() {
        assert!(TestCli::try_parse_from(["primer", "--only", "video"]).is_err());
    }

    #[test]
    fn test_mock_run_writes_catalog() {
        let dir = std::env::temp_dir().join(format!("primer_cli_gen_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let seeds = dir.join("seeds.json");
        std::fs::write(&seeds, r#"[["苹果", "食物"], ["飞机", "航空器"]]"#).unwrap();

        let mut config = PrimerConfig::default();
        config.generation.text_provider = "mock".to_string();
        config.generation.image_provider = "mock".to_string();
        config.generation.speech_provider = "mock".to_string();
        config.catalog.layout.asset_root = dir.clone();

        let args = parse(&["--seeds", seeds.to_str().unwrap(), "--delay-ms", "0"]);
        let success = run(config.clone(), args).unwrap();
        assert!(success);

        let catalog = CatalogStore::new(config.catalog_path()).load().unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.iter().all(|e| e.is_complete()));

        std::fs::remove_dir_all(&dir).ok();
    }
}
