/// Unit steps: seconds→minutes→hours→days→weeks→months→years.
const STEPS: [(f64, &str); 6] = [
    (60.0, "second"),
    (60.0, "minute"),
    (24.0, "hour"),
    (7.0, "day"),
    (365.0 / 7.0 / 12.0, "week"),
    (12.0, "month"),
];

/// Human relative time for a pin's creation date, e.g. "3 hours ago".
///
/// Negative values describe the future ("in 2 days"), which happens when the
/// server clock runs ahead of the browser's.
pub fn time_ago(elapsed_secs: i64) -> String {
    let future = elapsed_secs < 0;
    let mut diff = elapsed_secs.unsigned_abs() as f64;
    let mut unit = "year";
    for (step, name) in STEPS {
        if diff < step {
            unit = name;
            break;
        }
        diff /= step;
    }
    let n = diff.floor() as u64;

    if unit == "second" && n <= 9 {
        return if future { "right now" } else { "just now" }.to_string();
    }
    let amount = if unit != "second" && n <= 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    };
    if future {
        format!("in {amount}")
    } else {
        format!("{amount} ago")
    }
}
