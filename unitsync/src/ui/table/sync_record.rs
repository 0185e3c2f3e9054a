use std::time::Duration;

/// Result of reconciling one deployment unit.
#[derive(Clone, Debug)]
pub struct SyncRecord {
    pub unit_id: String,
    pub pod_name: String,
    pub node_name: Option<String>,
    pub elapsed: Duration,

    /// `None` when the pod became ready.
    pub error: Option<String>,
}

impl SyncRecord {
    pub const fn is_ready(&self) -> bool { self.error.is_none() }
}

pub trait SyncRecordsExt {
    /// Columns: UNIT, POD, NODE, RESULT, ELAPSED.
    fn render_table(&self) -> String;
}

impl SyncRecordsExt for [SyncRecord] {
    fn render_table(&self) -> String {
        let rows = self.iter().map(record_column).collect::<Vec<_>>();
        super::new_table()
            .set_header(vec!["UNIT", "POD", "NODE", "RESULT", "ELAPSED"])
            .add_rows(rows)
            .to_string()
    }
}

fn record_column(record: &SyncRecord) -> [String; 5] {
    [
        record.unit_id.clone(),
        record.pod_name.clone(),
        record.node_name.clone().unwrap_or_default(),
        record.error.clone().unwrap_or_else(|| "Ready".to_string()),
        format!("{:.1}s", record.elapsed.as_secs_f64()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_column() {
        let ready = SyncRecord {
            unit_id: "abcdef1234567890".to_string(),
            pod_name: "web-abcdef12".to_string(),
            node_name: Some("node-1".to_string()),
            elapsed: Duration::from_millis(2_340),
            error: None,
        };
        assert!(ready.is_ready());
        assert_eq!(
            record_column(&ready),
            ["abcdef1234567890", "web-abcdef12", "node-1", "Ready", "2.3s"]
        );

        let failed = SyncRecord {
            node_name: None,
            error: Some("Reconciliation of pod web-abcdef12 was cancelled".to_string()),
            ..ready
        };
        assert!(!failed.is_ready());
        assert_eq!(record_column(&failed)[2], "");
        assert_eq!(record_column(&failed)[3], "Reconciliation of pod web-abcdef12 was cancelled");

        let table = [failed].render_table();
        assert!(table.contains("RESULT"));
        assert!(table.contains("web-abcdef12"));
    }
}
