//! Text exposition rendering for aggregated snapshots.
//!
//! Pure string assembly: a sequence of measurements becomes
//! newline-terminated `name{label="value",...} value` lines behind a banner
//! comment. Reserved and empty-valued labels are pruned, remaining labels
//! are sorted by name, and the whole line set is sorted, so rendering is
//! byte-deterministic for a given input multiset.

use crate::measure::{HASH_LABEL, Measurement, NAME_LABEL, TARGET_LABEL};

/// Banner comment prepended to every rendered snapshot.
pub const BANNER: &str = "\n# These metrics generated by ostinato.\n";

/// Renders a snapshot: banner plus one sorted exposition line per
/// measurement.
pub fn render(measurements: &[Measurement]) -> String {
    let mut lines: Vec<String> = measurements.iter().map(line).collect();
    lines.sort_unstable();

    let mut out = String::with_capacity(BANNER.len() + lines.iter().map(String::len).sum::<usize>());
    out.push_str(BANNER);
    for l in &lines {
        out.push_str(l);
    }
    out
}

/// Renders a single measurement as a newline-terminated exposition line.
///
/// The label braces exclude the reserved entries and any empty-valued
/// label; what remains is sorted lexicographically by name. A measurement
/// with nothing left renders `name{} value`.
pub fn line(measurement: &Measurement) -> String {
    let name = measurement
        .labels
        .get(NAME_LABEL)
        .map(String::as_str)
        .unwrap_or_default();

    let mut pairs: Vec<(&str, &str)> = measurement
        .labels
        .iter()
        .filter(|(key, value)| !value.is_empty() && !reserved(key))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    pairs.sort_unstable_by_key(|(key, _)| *key);

    let labels: Vec<String> = pairs
        .iter()
        .map(|(key, value)| format!("{key}=\"{value}\""))
        .collect();

    format!(
        "{name}{{{}}} {}\n",
        labels.join(","),
        format_value(measurement.value)
    )
}

/// Labels consumed by the pipeline itself, never rendered.
fn reserved(key: &str) -> bool {
    key == NAME_LABEL || key == HASH_LABEL || key == TARGET_LABEL
}

/// Formats a value in the shortest decimal form that round-trips at
/// single precision.
#[allow(clippy::cast_possible_truncation)] // single-precision output is the exposition contract
fn format_value(value: f64) -> String {
    let single = value as f32;
    if single.is_infinite() {
        return if single.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        };
    }
    format!("{single}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latency(host: &str, value: f64) -> Measurement {
        Measurement::new("svc_latency", value).with_label("host", host)
    }

    #[test]
    fn test_line_shape() {
        assert_eq!(line(&latency("a", 1.5)), "svc_latency{host=\"a\"} 1.5\n");
    }

    #[test]
    fn test_line_sorts_labels() {
        let m = Measurement::new("m", 1.0)
            .with_label("zone", "z1")
            .with_label("app", "api")
            .with_label("host", "a");
        assert_eq!(line(&m), "m{app=\"api\",host=\"a\",zone=\"z1\"} 1\n");
    }

    #[test]
    fn test_line_prunes_reserved_and_empty_labels() {
        let m = Measurement::new("m", 2.0)
            .with_label(HASH_LABEL, "deadbeef")
            .with_label(TARGET_LABEL, "somewhere")
            .with_label("blank", "")
            .with_label("host", "a");
        assert_eq!(line(&m), "m{host=\"a\"} 2\n");
    }

    #[test]
    fn test_line_without_labels() {
        assert_eq!(line(&Measurement::new("m", 1.0)), "m{} 1\n");
    }

    #[test]
    fn test_value_single_precision_shortest() {
        // 0.1 has no exact binary form; the shortest f32 round-trip is "0.1".
        assert_eq!(line(&Measurement::new("m", 0.1)).trim_end(), "m{} 0.1");
        assert_eq!(line(&Measurement::new("m", -2.5)).trim_end(), "m{} -2.5");
    }

    #[test]
    fn test_value_infinities() {
        assert_eq!(
            line(&Measurement::new("m", f64::INFINITY)).trim_end(),
            "m{} +Inf"
        );
        assert_eq!(
            line(&Measurement::new("m", f64::NEG_INFINITY)).trim_end(),
            "m{} -Inf"
        );
    }

    #[test]
    fn test_render_starts_with_banner() {
        let out = render(&[latency("a", 1.5)]);
        assert!(out.starts_with(BANNER));
        assert!(out.contains("svc_latency{host=\"a\"} 1.5\n"));
    }

    #[test]
    fn test_render_deterministic_across_input_order() {
        let forward = vec![latency("a", 1.0), latency("b", 2.0), latency("c", 3.0)];
        let backward = vec![latency("c", 3.0), latency("b", 2.0), latency("a", 1.0)];
        assert_eq!(render(&forward), render(&backward));
    }

    #[test]
    fn test_render_repeat_is_byte_identical() {
        let batch = vec![latency("a", 1.0), latency("b", 2.0)];
        assert_eq!(render(&batch), render(&batch));
    }

    #[test]
    fn test_render_empty_batch_is_banner_only() {
        assert_eq!(render(&[]), BANNER);
    }
}
