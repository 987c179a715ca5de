use colored::*;
use console::Emoji;
use std::time::Instant;

static CHECK: Emoji<'_, '_> = Emoji("✓", "+");
static PACKAGE: Emoji<'_, '_> = Emoji("📦", ">");

pub struct MusubiUI {
    start_time: Instant,
}

impl MusubiUI {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    pub fn show_banner(&self) {
        println!(
            "\n  {} {}",
            "MUSUBI".bright_cyan().bold(),
            format!("v{}", env!("CARGO_PKG_VERSION")).bright_white()
        );
        println!();
    }

    pub fn show_serving(&self, port: u16, static_dir: &str) {
        println!();
        println!(
            "  {} {} {}",
            PACKAGE,
            "serving".bright_green(),
            static_dir.bright_cyan()
        );
        println!(
            "  {} {}",
            "local:".bright_black(),
            format!("http://localhost:{}/", port).bright_cyan().underline()
        );
        println!();
    }

    pub fn show_completion(&self, stats: CompletionStats) {
        let build_time = self.start_time.elapsed();

        println!();
        for file in &stats.output_files {
            println!(
                "  {}{} {}",
                format!("{}/", stats.outdir_label).bright_black(),
                file.name.bright_cyan(),
                format!("({})", human_size(file.size)).bright_black()
            );
        }

        if stats.assets_copied + stats.assets_skipped > 0 {
            println!();
            println!(
                "  {} {} assets copied, {} unchanged",
                PACKAGE,
                stats.assets_copied.to_string().bright_cyan().bold(),
                stats.assets_skipped.to_string().bright_cyan()
            );
        }

        let took = if build_time.as_secs_f64() >= 1.0 {
            format!("{:.2}s", build_time.as_secs_f64())
        } else {
            format!("{:.0}ms", build_time.as_secs_f64() * 1000.0)
        };
        println!();
        println!(
            "  {} built in {}",
            CHECK.to_string().bright_green(),
            took.bright_white().bold()
        );
    }
}

fn human_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let size = bytes as f64;
    if size < KB {
        format!("{} B", bytes)
    } else if size < KB * KB {
        format!("{:.1} kB", size / KB)
    } else {
        format!("{:.2} MB", size / (KB * KB))
    }
}

#[derive(Clone)]
pub struct CompletionStats {
    pub outdir_label: String,
    pub output_files: Vec<OutputFileInfo>,
    pub assets_copied: usize,
    pub assets_skipped: usize,
}

#[derive(Clone)]
pub struct OutputFileInfo {
    pub name: String,
    pub size: usize,
}

impl Default for MusubiUI {
    fn default() -> Self {
        Self::new()
    }
}
