//! Console output.
//!
//! Every line the organizer shows the user goes through [`OutputFormatter`].
//! Each call holds a process-wide lock for the duration of its write, so lines
//! emitted from different threads never interleave mid-line.

use colored::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::file_category::Category;

static CONSOLE: Mutex<()> = Mutex::new(());

fn console() -> MutexGuard<'static, ()> {
    CONSOLE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Centralized, serialized console output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints the program banner.
    pub fn banner(title: &str) {
        let _guard = console();
        println!("{}", title.bold());
    }

    /// Prints the `Moving: <src> -> <dst>` progress line for one file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use smart_organizer::output::OutputFormatter;
    /// use std::path::Path;
    ///
    /// OutputFormatter::moving(Path::new("in/a.txt"), Path::new("out/Documents/a.txt"));
    /// ```
    pub fn moving(source: &Path, destination: &Path) {
        let _guard = console();
        println!(
            "Moving: {} -> {}",
            source.display(),
            destination.display().to_string().cyan()
        );
    }

    /// Prints the dry-run counterpart of [`OutputFormatter::moving`].
    pub fn would_move(source: &Path, destination: &Path) {
        let _guard = console();
        println!(
            "{} {} -> {}",
            "[DRY RUN] Would move:".yellow(),
            source.display(),
            destination.display()
        );
    }

    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        let _guard = console();
        println!("{} {}", "✓".green(), message);
    }

    /// Prints `Error: <message>` in red on standard error.
    pub fn error(message: &str) {
        let _guard = console();
        eprintln!("{} {}", "Error:".red(), message);
    }

    /// Prints a warning message in yellow on standard error.
    pub fn warning(message: &str) {
        let _guard = console();
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        let _guard = console();
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        let _guard = console();
        println!("{}", message);
    }

    /// Prints a summary table with file counts by category.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use smart_organizer::file_category::Category;
    /// use smart_organizer::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert(Category::Documents, 15);
    /// counts.insert(Category::Images, 8);
    /// OutputFormatter::summary_table(&counts, 23, 0);
    /// ```
    pub fn summary_table(
        category_counts: &BTreeMap<Category, usize>,
        moved: usize,
        failed: usize,
    ) {
        let _guard = console();
        println!("\n{}", "SUMMARY".bold());

        let width = category_counts
            .keys()
            .map(|category| category.dir_name().len())
            .max()
            .unwrap_or(0)
            .max(8); // "Category"

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category.dir_name(),
                count.to_string().green(),
                file_word(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            moved.to_string().green().bold(),
            file_word(moved),
            width = width
        );
        if failed > 0 {
            println!(
                "{:<width$} | {} {}",
                "Failed".bold(),
                failed.to_string().red().bold(),
                file_word(failed),
                width = width
            );
        }
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_file_word() {
        assert_eq!(file_word(0), "files");
        assert_eq!(file_word(1), "file");
        assert_eq!(file_word(2), "files");
    }

    #[test]
    fn test_console_lock_survives_poisoning() {
        let _ = thread::spawn(|| {
            let _guard = console();
            panic!("poison the console lock");
        })
        .join();

        // Output keeps working after a writer panicked mid-line.
        OutputFormatter::plain("still writable");
        drop(console());
    }
}
