//! Console output formatter for tool runs

use colored::{ColoredString, Colorize};
use waverun_domain::{RunState, ToolRun};

/// Formats tool runs for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Enable or disable ANSI colors process-wide
    pub fn set_color(enabled: bool) {
        colored::control::set_override(enabled);
    }

    /// Format a single tool run with all its fields
    pub fn format_tool(tool: &ToolRun) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {}\n",
            tool.detailed_summary().bold(),
            Self::status_badge(tool)
        ));
        output.push_str(&Self::field("id", tool.id().unwrap_or("-")));
        output.push_str(&Self::field("level", tool.level().as_str()));
        output.push_str(&Self::field("target", &tool.address().to_string()));
        if !tool.text().is_empty() {
            output.push_str(&Self::field("text", tool.text()));
        }
        output.push_str(&Self::field("runner", tool.runner_id().unwrap_or("-")));
        output.push_str(&Self::field(
            "started",
            &tool
                .started_at()
                .map_or_else(|| "-".to_string(), |at| at.to_rfc3339()),
        ));
        output.push_str(&Self::field(
            "finished",
            &tool
                .finished_at()
                .map_or_else(|| "-".to_string(), |at| at.to_rfc3339()),
        ));
        if !tool.result_file().is_empty() {
            output.push_str(&Self::field("result", tool.result_file()));
        }
        if !tool.tags().is_empty() {
            output.push_str(&Self::field("tags", &tool.tags().join(", ")));
        }
        for (key, value) in tool.infos() {
            output.push_str(&Self::field(&format!("info.{}", key), &value.to_string()));
        }
        if !tool.notes().is_empty() {
            output.push_str(&format!("\n{}\n", tool.notes()));
        }

        output
    }

    /// One line per tool run
    pub fn format_list(tools: &[ToolRun]) -> String {
        if tools.is_empty() {
            return format!("{}\n", "No tool runs".dimmed());
        }
        tools
            .iter()
            .map(|tool| {
                format!(
                    "{}  {} {}\n",
                    tool.id().unwrap_or("-").dimmed(),
                    tool.detailed_summary(),
                    Self::status_badge(tool)
                )
            })
            .collect()
    }

    /// Output directory and command of a prepared tool run
    pub fn format_command(output_dir: &str, command: &str, unresolved: &[String]) -> String {
        let mut output = format!(
            "{} {}\n{} {}\n",
            "Output:".cyan().bold(),
            output_dir,
            "Command:".cyan().bold(),
            command
        );
        if !unresolved.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                "Unresolved:".yellow().bold(),
                unresolved.join(" ")
            ));
        }
        output
    }

    /// Result of an `add` command
    pub fn format_registration(created: bool, id: &str) -> String {
        if created {
            format!("{} {}\n", "Created".green().bold(), id)
        } else {
            format!("{} {}\n", "Already registered".yellow().bold(), id)
        }
    }

    /// Format as JSON (persisted layout)
    pub fn format_json(tool: &ToolRun) -> String {
        serde_json::to_string_pretty(&tool.to_document(None)).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format a list as a JSON array
    pub fn format_list_json(tools: &[ToolRun]) -> String {
        let documents: Vec<_> = tools.iter().map(|tool| tool.to_document(None)).collect();
        serde_json::to_string_pretty(&documents).unwrap_or_else(|_| "[]".to_string())
    }

    fn status_badge(tool: &ToolRun) -> ColoredString {
        let status = tool.status();
        let text = format!("[{}]", status);
        match status.state() {
            RunState::Idle => text.normal(),
            RunState::Running => text.blue().bold(),
            RunState::Done => text.green().bold(),
            RunState::Error => text.red().bold(),
        }
    }

    fn field(name: &str, value: &str) -> String {
        format!("  {:<10} {}\n", format!("{}:", name).cyan(), value)
    }
}
