use metrics_util::debugging::{DebugValue, Snapshotter};

/// Current value of the counter `name` carrying `label`, if it was ever emitted
pub fn counter_value(snapshotter: &Snapshotter, name: &str, label: (&str, &str)) -> Option<u64> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find_map(|(key, _, _, value)| {
            let key = key.key();
            let labelled = key
                .labels()
                .any(|l| l.key() == label.0 && l.value() == label.1);

            match value {
                DebugValue::Counter(count) if key.name() == name && labelled => Some(count),
                _ => None,
            }
        })
}
