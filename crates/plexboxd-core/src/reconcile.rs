use plexboxd_models::ImportResult;
use serde::Serialize;

/// Exported row count compared with the count the site reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reconciliation {
    NotImported,
    Matched { count: u64 },
    Mismatch { exported: u64, imported: u64 },
}

pub fn reconcile(exported: usize, import: Option<&ImportResult>) -> Reconciliation {
    let Some(result) = import else {
        return Reconciliation::NotImported;
    };

    let exported = exported as u64;
    if result.imported_count == exported {
        Reconciliation::Matched { count: exported }
    } else {
        Reconciliation::Mismatch {
            exported,
            imported: result.imported_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imported(count: u64) -> ImportResult {
        ImportResult {
            imported_count: count,
            matched_titles: Vec::new(),
        }
    }

    #[test]
    fn test_reconcile() {
        assert_eq!(reconcile(3, None), Reconciliation::NotImported);
        assert_eq!(reconcile(3, Some(&imported(3))), Reconciliation::Matched { count: 3 });
        assert_eq!(
            reconcile(3, Some(&imported(2))),
            Reconciliation::Mismatch { exported: 3, imported: 2 }
        );
        assert_eq!(
            reconcile(0, Some(&imported(1))),
            Reconciliation::Mismatch { exported: 0, imported: 1 }
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Reconciliation::Mismatch { exported: 3, imported: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "mismatch", "exported": 3, "imported": 2}));
    }
}
