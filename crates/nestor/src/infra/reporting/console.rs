// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use crate::core::models::{BuildSnapshot, ComputerExecutors, JobStatus};
use chrono::{DateTime, Local};
use comfy_table::Table;
use console::{StyledObject, style};
use std::io::Write;

pub static CONSOLE_SEPARATOR: &str =
    "##############################################################################";

#[derive(Default)]
pub struct ConsoleReporter {
    use_colors: bool,
}

impl ConsoleReporter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn report_launched(&self, job: &str) {
        println!("Job {} was started successfully", job);
    }

    pub fn report_stopped(&self, job: &str) {
        println!("Job {} was stopped successfully", job);
    }

    pub fn report_dashboard(&self, jobs: &[(String, JobStatus)]) {
        if jobs.is_empty() {
            println!("Jobless Jenkins");
            return;
        }

        jobs.iter()
            .for_each(|(name, status)| println!("{} - {}", self.colored(&status.to_string()), name));
    }

    pub fn report_executors(&self, computers: &[ComputerExecutors]) {
        if computers.is_empty() {
            println!("No executor found");
            return;
        }

        let mut table = Table::new();
        table.set_header(vec!["Computer", "Executor", "Job", "Progress"]);

        computers.iter().for_each(|computer| {
            computer.executors.iter().enumerate().for_each(|(index, executor)| {
                let (job, progress) = match (executor.idle, &executor.job_name) {
                    (true, _) | (false, None) => ("idle".to_string(), String::new()),
                    (false, Some(name)) => (name.clone(), describe_progress(executor.progress, executor.stuck)),
                };

                table.add_row(vec![computer.name.clone(), format!("#{}", index), job, progress]);
            });
        });

        println!("{table}");
    }

    pub fn report_job(&self, name: &str, status: &JobStatus, health_reports: &[String]) {
        println!("{} | {}", name, self.colored(&status.to_string()));
        health_reports.iter().for_each(|report| println!(" - {}", report));
    }

    pub fn report_build_status(&self, job: &str, snapshot: &BuildSnapshot) {
        self.build_status_lines(job, snapshot)
            .iter()
            .for_each(|line| println!("{}", line));
    }

    pub fn report_variant(&self, result: &str, name: &str) {
        println!("||--- [{}] {}", self.colored(result), name);
    }

    pub fn report_console_started(&self) {
        println!("{}", CONSOLE_SEPARATOR);
    }

    pub fn report_console_chunk(&self, chunk: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(incident) = stdout.write_all(chunk.as_bytes()).and_then(|_| stdout.flush()) {
            log::warn!("[nestor.console] cannot write console output : {}", incident);
        }
    }

    /// Closes a console log whose last line has no line terminator
    pub fn report_console_finished(&self, line_open: bool) {
        if line_open {
            println!();
        }
    }

    pub fn report_queue(&self, tasks: &[String]) {
        if tasks.is_empty() {
            println!("Queue is empty");
            return;
        }

        tasks.iter().for_each(|task| println!("- {}", task));
    }

    pub fn report_version(&self, version: &str) {
        println!("Jenkins ver. {}", version);
    }

    pub fn report_failure(&self, error: &anyhow::Error) {
        eprintln!("{} {}", self.red("Error:"), error);
    }

    fn build_status_lines(&self, job: &str, snapshot: &BuildSnapshot) -> Vec<String> {
        let result = snapshot.derived_result().to_string();

        let parameters = snapshot
            .parameters()
            .iter()
            .map(|(name, value)| format!(" {}=\"{}\"", name, value))
            .collect::<String>();

        let duration = match snapshot.building {
            true => format!(
                "Estimated Duration {}",
                format_duration(snapshot.estimated_duration.max(0) as u64)
            ),
            false => format!("Duration: {}", format_duration(snapshot.duration)),
        };

        let mut lines = vec![
            format!("[#{}, {}] {}{}", snapshot.number, self.colored(&result), job, parameters),
            format!("|| Started at: {}", format_timestamp(snapshot.timestamp)),
            format!("|| {}", duration),
        ];

        if let Some(uuid) = &snapshot.uuid {
            lines.push(format!("|| UUID: {}", uuid));
        }

        lines
    }

    fn colored<'a>(&self, label: &'a str) -> StyledObject<&'a str> {
        if !self.use_colors {
            return style(label);
        }

        match label {
            "OK" | "SUCCESS" => style(label).green(),
            "FAIL" | "FAILURE" => style(label).red(),
            "WARN" | "IN PROGRESS" => style(label).yellow(),
            _ => style(label).dim(),
        }
    }

    fn red<T>(&self, what: T) -> StyledObject<T> {
        match self.use_colors {
            true => style(what).red(),
            false => style(what),
        }
    }
}

fn describe_progress(progress: i64, stuck: bool) -> String {
    match stuck {
        true => format!("{}% stuck!", progress),
        false => format!("{}%", progress),
    }
}

fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|moment| moment.with_timezone(&Local).format("%a %b %d %Y %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Renders milliseconds as `1h2m3s`, rounding seconds up
pub fn format_duration(millis: u64) -> String {
    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    let seconds = (millis % 60_000).div_ceil(1000);

    let mut formatted = String::new();

    if hours > 0 {
        formatted.push_str(&format!("{}h", hours));
    }

    if minutes > 0 || hours > 0 {
        formatted.push_str(&format!("{}m", minutes));
    }

    formatted.push_str(&format!("{}s", seconds));
    formatted
}
