//! Index settings and mapping bodies for the region schema.
//!
//! Mappings disable full-text analysis of the payload and keep only the
//! raw source: the region index is looked up by id and position, never
//! queried as text.

use serde_json::{json, Value};

/// Residency bookkeeping index: one record per resident entity.
pub const RESIDENT_DATASETS_INDEX: &str = "resident_datasets";

/// Doctype under the residency index.
pub const RESIDENT_DOCTYPE: &str = "default";

/// Index holding indexer state records and hand-off lists.
pub const META_INDEX: &str = "meta";

/// Doctype under the meta index.
pub const META_DOCTYPE: &str = "meta";

/// Region indices are small and never sharded.
pub fn index_settings() -> Value {
    json!({
        "index": {
            "number_of_shards": 1
        }
    })
}

/// Mapping for positional interval documents, one doctype per assembly.
pub fn region_mapping(assembly: &str) -> Value {
    json!({
        assembly: {
            "_all": { "enabled": false },
            "_source": { "enabled": true },
            "properties": {
                "uuid": {
                    "type": "string",
                    "index": "not_analyzed"
                },
                "positions": {
                    "type": "nested",
                    "properties": {
                        "start": { "type": "long" },
                        "end": { "type": "long" }
                    }
                }
            }
        }
    })
}

/// Mapping for gene-quantification documents, one doctype per assembly.
pub fn expression_mapping(assembly: &str) -> Value {
    json!({
        assembly: {
            "_all": { "enabled": false },
            "_source": { "enabled": true },
            "properties": {
                "uuid": {
                    "type": "string",
                    "index": "not_analyzed"
                },
                "expression": {
                    "type": "nested",
                    "properties": {
                        "transcript_id": { "type": "string" },
                        "gene_id": { "type": "string" },
                        "tpm": { "type": "long" },
                        "fpkm": { "type": "long" }
                    }
                }
            }
        }
    })
}

/// Mapping for the residency index.
pub fn residency_mapping() -> Value {
    json!({
        RESIDENT_DOCTYPE: {
            "_all": { "enabled": false },
            "_source": { "enabled": true }
        }
    })
}
