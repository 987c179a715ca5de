use crate::core::models::{
    BudgetHints, BudgetKind, BudgetOptions, BudgetViolation, OutputFile, OutputKind,
};
use crate::utils::Logger;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

/// Size of `bytes` after gzip compression. Falls back to the raw size if
/// encoding fails, so budget reporting can never abort a build.
pub fn gzip_size(bytes: &[u8]) -> u64 {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    if encoder.write_all(bytes).is_err() {
        return bytes.len() as u64;
    }
    match encoder.finish() {
        Ok(compressed) => compressed.len() as u64,
        Err(_) => bytes.len() as u64,
    }
}

/// Compare emitted files against the advisory budgets. Source maps are
/// exempt from the asset budget, matching the usual asset filter.
pub fn check_budgets(options: &BudgetOptions, outputs: &[OutputFile]) -> Vec<BudgetViolation> {
    if options.hints == BudgetHints::Off {
        return Vec::new();
    }

    let mut violations = Vec::new();

    for output in outputs {
        if output.kind == OutputKind::Bundle && output.size > options.max_entrypoint_size {
            violations.push(violation(output, BudgetKind::Entrypoint, options.max_entrypoint_size));
        }

        if output.kind != OutputKind::SourceMap && output.size > options.max_asset_size {
            violations.push(violation(output, BudgetKind::Asset, options.max_asset_size));
        }
    }

    violations
}

/// Log every violation as a warning. Budgets are advisory, so this is the
/// only consequence of exceeding them.
pub fn report_violations(violations: &[BudgetViolation]) {
    if violations.is_empty() {
        return;
    }

    for violation in violations {
        Logger::warn(&violation.to_string());
    }
    Logger::warn("Budgets are advisory; builds are never failed by size limits");
}

fn violation(output: &OutputFile, kind: BudgetKind, limit: u64) -> BudgetViolation {
    // Gzip size is computed only for files already over budget
    let gzip_size = std::fs::read(&output.path)
        .map(|bytes| gzip_size(&bytes))
        .unwrap_or(output.size);

    BudgetViolation {
        kind,
        path: output.path.clone(),
        size: output.size,
        gzip_size,
        limit,
    }
}
