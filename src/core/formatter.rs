use chrono::{DateTime, Local, Utc};

const BYTE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Human-readable size with 1024-based units, rounded to two decimals.
/// "0 Bytes", "1.5 KB", "2 GB".
pub fn format_bytes(bytes: f64) -> String {
    if !bytes.is_finite() || bytes <= 0.0 {
        return "0 Bytes".to_string();
    }
    let k = 1024.0_f64;
    let exp = ((bytes.ln() / k.ln()).floor().max(0.0) as usize).min(BYTE_UNITS.len() - 1);
    let value = (bytes / k.powi(exp as i32) * 100.0).round() / 100.0;
    format!("{} {}", value, BYTE_UNITS[exp])
}

/// Returns "$12.34".
pub fn format_cost(cost: f64) -> String {
    format!("${:.2}", cost)
}

/// Sub-cent amounts keep four decimals so small per-task costs stay visible.
pub fn format_cost_precise(cost: f64) -> String {
    if cost != 0.0 && cost.abs() < 0.01 {
        format!("${:.4}", cost)
    } else {
        format_cost(cost)
    }
}

/// Returns "[████████░░░░]" where █ is `value`'s share of `max`.
/// Width is the number of block characters inside the brackets.
pub fn format_share_bar(value: f64, max: f64, width: usize) -> String {
    let share = if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled_blocks = (share * width as f64).round() as usize;
    let empty_blocks = width.saturating_sub(filled_blocks);

    format!("[{}{}]", "█".repeat(filled_blocks), "░".repeat(empty_blocks))
}

/// Returns "Generated 2026-10-16 14:05" in local time.
pub fn format_generated_at(at: &DateTime<Utc>) -> String {
    format!(
        "Generated {}",
        at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    )
}
