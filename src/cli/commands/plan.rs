//! Plan command - print build waves without triggering builds

use crate::cli::args::{OutputFormat, PlanArgs};
use crate::cli::commands::batch;
use crate::config::Config;
use crate::error::BcschedResult;
use crate::graph::{BuildConfigId, BuildGraph, GraphBuilder};
use crate::resource::ResourceIdentity;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct WaveView<'a> {
    wave: usize,
    build_configs: Vec<&'a ResourceIdentity>,
}

/// Execute the plan command
pub async fn execute(args: PlanArgs, config: &Config, namespace: Option<String>) -> BcschedResult<()> {
    let mut prepared = batch::prepare(&args.resources, config, namespace).await?;
    let graph = GraphBuilder::new(&mut prepared.cache)
        .build(&prepared.build_configs)
        .await?;
    let waves = graph.waves()?;

    match args.format {
        OutputFormat::Table => print_table(&graph, &waves),
        OutputFormat::Json => {
            let views: Vec<WaveView<'_>> = waves
                .iter()
                .enumerate()
                .map(|(i, wave)| WaveView {
                    wave: i + 1,
                    build_configs: wave
                        .iter()
                        .map(|id| graph.build_config(*id).identity())
                        .collect(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
        OutputFormat::Plain => {
            for wave in &waves {
                let names: Vec<&str> = wave
                    .iter()
                    .map(|id| graph.build_config(*id).identity().name())
                    .collect();
                println!("{}", names.join(" "));
            }
        }
    }

    Ok(())
}

fn print_table(graph: &BuildGraph, waves: &[Vec<BuildConfigId>]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Build plan");

    for (i, wave) in waves.iter().enumerate() {
        println!();
        println!("{}", style(format!("Wave {}", i + 1)).bold());
        for id in wave {
            let node = graph.build_config(*id);
            let inputs: Vec<String> = node
                .dependencies()
                .iter()
                .map(|stream| {
                    let stream = graph.image_stream(*stream);
                    match stream.producer() {
                        Some(_) => stream.identity().name().to_string(),
                        None => format!("{} (external)", stream.identity().name()),
                    }
                })
                .collect();
            if inputs.is_empty() {
                println!("  {}", node.identity().name());
            } else {
                println!(
                    "  {} {} {}",
                    node.identity().name(),
                    style("<-").dim(),
                    inputs.join(", ")
                );
            }
        }
    }

    println!();
    ui::step_info(
        &ctx,
        &format!("{} build config(s) in {} wave(s)", graph.len(), waves.len()),
    );
}
