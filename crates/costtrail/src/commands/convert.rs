use costtrail_core::PipelineOptions;
use costtrail_files::{find_repo_root, resolve_output_root, ConvertReport};
use std::path::Path;

fn output_options(
    file: &Path,
    output_base: Option<&Path>,
    walk_up: bool,
) -> anyhow::Result<PipelineOptions> {
    if let Some(base) = output_base {
        return Ok(PipelineOptions::new(base));
    }

    let config = costtrail_files::load_config();
    let cwd = std::env::current_dir()?;
    let fallback = if walk_up {
        find_repo_root(&cwd).unwrap_or(cwd)
    } else {
        cwd
    };
    let root = resolve_output_root(file, &fallback);
    Ok(PipelineOptions::new(root.join(&config.output_subdir)).with_working_directory(true))
}

fn report_lines(report: &ConvertReport) -> Vec<String> {
    vec![
        format!(
            "Processing file: {} (Size: {} KB)",
            report.input.display(),
            report.input_bytes / 1024
        ),
        format!("Parsed {} messages", report.record_count),
        format!("Cost tracker CSV generated: {}", report.output_path.display()),
        format!("Total records: {}", report.record_count),
        format!("Total cost: ${:.6}", report.total_cost),
    ]
}

pub fn run(file: &Path, output_base: Option<&Path>, walk_up: bool) -> anyhow::Result<()> {
    let options = output_options(file, output_base, walk_up)?;
    let report = costtrail_files::convert(file, &options)?;

    for line in report_lines(&report) {
        println!("{}", line);
    }
    Ok(())
}
