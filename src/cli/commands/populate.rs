//! Populate command implementation.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

use crate::cli::output::{OutputFormat, get_formatter};
use crate::models::Config;
use crate::services::{
    BatchPartitioner, BulkSubmitter, DocumentGenerator, EmbeddingStore, IndexClient,
    PopulateStats, feed_documents, filter_on_block_type,
};
use crate::utils::file::read_parser_outputs;

#[derive(Debug, Args)]
pub struct PopulateArgs {
    /// Directory containing parser output JSON files
    #[arg(long, value_name = "DIR")]
    pub parser_output_dir: PathBuf,

    /// Directory containing per-document embedding .npy artifacts
    #[arg(long, value_name = "DIR")]
    pub embeddings_dir: PathBuf,

    /// Index instance URL
    #[arg(long, env = "VESPA_INSTANCE_URL")]
    pub index_url: Option<String>,

    /// Path to the TLS key PEM
    #[arg(long, env = "VESPA_KEY_LOCATION", value_name = "FILE")]
    pub key_path: Option<PathBuf>,

    /// Path to the TLS cert PEM
    #[arg(long, env = "VESPA_CERT_LOCATION", value_name = "FILE")]
    pub cert_path: Option<PathBuf>,

    /// Family documents buffered before a flush
    #[arg(long, env = "VESPA_DOCUMENT_BATCH_SIZE")]
    pub document_batch_size: Option<usize>,

    /// Simultaneous connections per bulk call
    #[arg(long)]
    pub connections: Option<usize>,

    /// Entries per bulk call chunk
    #[arg(long)]
    pub sub_batch_size: Option<usize>,

    /// Text block types to drop before generation (comma-separated)
    #[arg(long, env = "BLOCKS_TO_FILTER", value_delimiter = ',')]
    pub exclude_block_types: Option<Vec<String>>,

    /// Generate and batch records without submitting anything
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_populate(
    args: PopulateArgs,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let config = merged_config(&args, Config::load()?);
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    // Configuration issues surface before any input is read or generated.
    let submitter = if args.dry_run {
        None
    } else {
        let connection = config.index.connection()?;
        let client = IndexClient::new(&connection)?;
        Some(BulkSubmitter::new(
            client,
            config.index.connections,
            config.index.sub_batch_size,
        ))
    };

    let tasks =
        read_parser_outputs(&args.parser_output_dir).context("failed to read parser outputs")?;
    if verbose {
        println!("Found {} parser outputs to process", tasks.len());
    }

    let tasks = filter_on_block_type(tasks, &config.filter.excluded_block_types);

    let pb = ProgressBar::new(tasks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );
    let progress = pb.clone();
    let tasks_iter = tasks.into_iter().map(move |task| {
        progress.inc(1);
        task
    });

    let generator = DocumentGenerator::new(tasks_iter, EmbeddingStore::new(&args.embeddings_dir));
    let partitioner = BatchPartitioner::new(config.index.document_batch_size);

    let mut stats = match submitter {
        Some(submitter) => feed_documents(generator, partitioner, &submitter).await?,
        None => dry_run(generator, partitioner)?,
    };

    pb.finish_and_clear();
    stats.duration_ms = start_time.elapsed().as_millis() as u64;

    if args.dry_run {
        println!(
            "{}",
            formatter.format_message("Dry run: nothing was submitted.")
        );
    }
    print!("{}", formatter.format_populate_stats(&stats));

    Ok(())
}

/// Drives the generator and partitioner without touching the network.
fn dry_run<I>(
    generator: DocumentGenerator<I>,
    mut partitioner: BatchPartitioner,
) -> Result<PopulateStats>
where
    I: Iterator<Item = crate::models::ParsedDocument>,
{
    use crate::models::Schema;

    let mut stats = PopulateStats::default();
    for item in generator {
        let document = item?;
        match document.schema {
            Schema::FamilyDocument => stats.documents += 1,
            Schema::DocumentPassage => stats.passages += 1,
            Schema::SearchWeights => {}
        }
        stats.records += 1;
        if partitioner.push(document).is_some() {
            stats.flushes += 1;
        }
    }
    if partitioner.finish().is_some() {
        stats.flushes += 1;
    }
    Ok(stats)
}

fn merged_config(args: &PopulateArgs, mut config: Config) -> Config {
    if let Some(ref url) = args.index_url {
        config.index.url = Some(url.clone());
    }
    if let Some(ref key_path) = args.key_path {
        config.index.key_path = Some(key_path.clone());
    }
    if let Some(ref cert_path) = args.cert_path {
        config.index.cert_path = Some(cert_path.clone());
    }
    if let Some(document_batch_size) = args.document_batch_size {
        config.index.document_batch_size = document_batch_size;
    }
    if let Some(connections) = args.connections {
        config.index.connections = connections;
    }
    if let Some(sub_batch_size) = args.sub_batch_size {
        config.index.sub_batch_size = sub_batch_size;
    }
    if let Some(ref exclude) = args.exclude_block_types {
        config.filter.excluded_block_types = exclude.clone();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> PopulateArgs {
        PopulateArgs {
            parser_output_dir: PathBuf::from("/tmp/in"),
            embeddings_dir: PathBuf::from("/tmp/emb"),
            index_url: None,
            key_path: None,
            cert_path: None,
            document_batch_size: None,
            connections: None,
            sub_batch_size: None,
            exclude_block_types: None,
            dry_run: false,
        }
    }

    #[test]
    fn test_merged_config_overrides() {
        let args = PopulateArgs {
            index_url: Some("https://index.example.com".to_string()),
            document_batch_size: Some(25),
            exclude_block_types: Some(vec!["Table".to_string()]),
            ..base_args()
        };

        let config = merged_config(&args, Config::default());
        assert_eq!(
            config.index.url.as_deref(),
            Some("https://index.example.com")
        );
        assert_eq!(config.index.document_batch_size, 25);
        assert_eq!(config.filter.excluded_block_types, vec!["Table".to_string()]);
    }

    #[test]
    fn test_merged_config_keeps_defaults() {
        let config = merged_config(&base_args(), Config::default());
        assert!(config.index.url.is_none());
        assert_eq!(config.index.connections, 50);
        assert_eq!(
            config.filter.excluded_block_types,
            vec!["Table".to_string(), "Figure".to_string()]
        );
    }
}
