//! Build command - trigger builds in dependency order

use crate::cli::args::{BuildArgs, OutputFormat};
use crate::cli::commands::batch;
use crate::cluster::BuildStatus;
use crate::config::{Config, FailurePolicy};
use crate::error::BcschedResult;
use crate::scheduler::{BuildReport, Scheduler, SchedulerOptions};
use crate::ui::{self, BuildProgress, TaskSpinner, UiContext};
use console::style;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config, namespace: Option<String>) -> BcschedResult<()> {
    let ctx = UiContext::detect();
    let human = args.format == OutputFormat::Table;

    let mut build = config.build.clone();
    if let Some(secs) = args.timeout {
        build.timeout_secs = secs;
    }
    if let Some(max) = args.max_concurrent {
        build.max_concurrent = max;
    }
    if args.ignore_failures {
        build.on_failure = FailurePolicy::Ignore;
    }
    let options = SchedulerOptions::from(&build);

    let prepared = batch::prepare(&args.resources, config, namespace).await?;
    let total = prepared.build_configs.len();

    let mut scheduler = Scheduler::new(prepared.cache, options);
    let graph = if human {
        ui::intro(&ctx, "bcsched build");
        ui::key_value(&ctx, "namespace", scheduler.cache().default_namespace());
        ui::key_value(&ctx, "on failure", &build.on_failure.to_string());

        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Resolving dependencies...");
        match scheduler.plan(&prepared.build_configs).await {
            Ok(graph) => {
                spinner.stop(&format!(
                    "{} build config(s), {} image stream(s)",
                    graph.len(),
                    graph.image_stream_count()
                ));
                graph
            }
            Err(e) => {
                spinner.stop_error("Could not resolve dependencies");
                return Err(e);
            }
        }
    } else {
        scheduler.plan(&prepared.build_configs).await?
    };

    let progress = if human {
        BuildProgress::new(&ctx, total)
    } else {
        BuildProgress::hidden()
    };
    let observer = progress.clone();
    let mut scheduler = scheduler.with_observer(move |event| observer.on_event(event));
    let result = scheduler.run(graph).await;
    progress.finish();
    let report = result?;

    match args.format {
        OutputFormat::Table => print_table(&ctx, &report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            for identifier in &report.identifiers {
                println!("{}", identifier);
            }
        }
    }

    Ok(())
}

fn print_table(ctx: &UiContext, report: &BuildReport) {
    println!();
    println!(
        "{:<32} {:<32} {:<10} {:>8}",
        style("BUILD CONFIG").bold(),
        style("BUILD").bold(),
        style("STATUS").bold(),
        style("TIME").bold()
    );
    println!("{}", "-".repeat(85));

    for record in &report.builds {
        let build = record
            .build
            .as_ref()
            .map_or_else(|| "-".to_string(), |id| id.name().to_string());
        let status = if record.is_success() {
            style("complete").green()
        } else {
            style("failed").red()
        };
        println!(
            "{:<32} {:<32} {:<10} {:>7}s",
            record.build_config.name(),
            build,
            status,
            record.duration().num_seconds()
        );
    }
    println!();

    let failed = report.failed().count();
    if failed == 0 {
        ui::outro_success(
            ctx,
            &format!(
                "{} build(s) complete in {} sweep(s)",
                report.builds.len(),
                report.sweeps.len()
            ),
        );
    } else {
        for record in report.failed() {
            if let BuildStatus::Failed { phase, message } = &record.outcome {
                let detail = message.as_deref().unwrap_or(phase);
                ui::step_error_detail(ctx, record.build_config.name(), detail);
            }
        }
        ui::outro_warn(ctx, &format!("{} of {} build(s) failed", failed, report.builds.len()));
    }
}
