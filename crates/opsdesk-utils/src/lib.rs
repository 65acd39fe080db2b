//! Formatting and escaping helpers shared by the table renderers

use rust_decimal::Decimal;

/// Format an integer string with thousands separators, keeping a leading sign
pub fn format_number<T: ToString>(n: T) -> String {
    let s = n.to_string();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };

    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    let grouped: String = result.chars().rev().collect();
    format!("{}{}", sign, grouped)
}

/// Format a monetary amount with two decimals and thousands separators
pub fn format_money(amount: &Decimal) -> String {
    let fixed = format!("{:.2}", amount.round_dp(2));
    match fixed.split_once('.') {
        Some((whole, fraction)) => format!("{}.{}", format_number(whole), fraction),
        None => format_number(fixed),
    }
}

/// Escape text for safe interpolation into HTML bodies and attributes
pub fn escape_html(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Shorten long free text (product introductions, remarks) for table cells
pub fn truncate(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let kept: String = content.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept)
}
