use crate::domain::model::{OutreachReport, RunOutcome};
use crate::utils::error::OutreachError;

/// 終端輸出：職缺摘要、比對結果、郵件與備援狀態
pub fn render_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::NoPostings { url, dropped } => {
            let mut text = format!("📭 No job postings found on {}", url);
            if *dropped > 0 {
                text.push_str(&format!(
                    "\n⚠️ {} postings were returned but missing required fields",
                    dropped
                ));
            }
            text
        }
        RunOutcome::Completed(report) => render_report(report),
    }
}

fn render_report(report: &OutreachReport) -> String {
    let job = &report.job;
    let mut lines = vec![
        "📋 Job Details:".to_string(),
        format!("  Role: {}", job.role),
        format!("  Experience: {}", job.experience),
        format!("  Skills: {}", job.skills_joined()),
        format!("  Location: {}", job.location),
        String::new(),
        "📊 Portfolio Matches:".to_string(),
    ];

    if report.matches.is_empty() {
        lines.push("  (none)".to_string());
    }
    for stack in &report.matches.tech_stacks {
        lines.push(format!("  - {}", stack));
    }
    for link in &report.matches.links {
        lines.push(format!("  🔗 {}", link));
    }

    for event in &report.fallbacks {
        lines.push(String::new());
        lines.push(format!(
            "⚠️ Rate limited during {} on '{}', recovered with '{}'",
            event.stage, event.primary, event.fallback
        ));
    }

    lines.push(String::new());
    lines.push("📧 Generated Email:".to_string());
    lines.push(report.email.clone());

    if let Some(path) = &report.output_path {
        lines.push(String::new());
        lines.push(format!("💾 Email saved to: {}", path));
    }

    lines.join("\n")
}

/// 記錄錯誤並輸出使用者訊息，回傳退出碼
pub fn report_failure(context: &str, e: &OutreachError) -> i32 {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    e.severity().exit_code()
}
