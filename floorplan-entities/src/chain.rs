//! Field tables chained from base kind to derived kind.

use floorplan_model::io::{Dumper, EntityRecord, IoResult, Loader};
use floorplan_model::{Entity, FieldSpec};

/// The field tables of a kind and its ancestors, base first.
///
/// Dumps and loads walk the tables in order, so a derived kind's record is
/// its parent's record plus its own fields.
#[derive(Debug, Clone)]
pub struct FieldChain {
    tables: &'static [&'static [FieldSpec]],
    fields: Vec<FieldSpec>,
}

impl FieldChain {
    #[must_use]
    pub fn new(tables: &'static [&'static [FieldSpec]]) -> Self {
        Self {
            tables,
            fields: tables.iter().flat_map(|t| t.iter().copied()).collect(),
        }
    }

    /// Every field of the chain.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[must_use]
    pub fn tables(&self) -> &'static [&'static [FieldSpec]] {
        self.tables
    }

    pub fn dump(&self, entity: &Entity, dumper: &mut Dumper<'_>) -> EntityRecord {
        let mut record = dumper.base_record(entity);
        for table in self.tables {
            dumper.write_fields(&mut record, entity, table);
        }
        record
    }

    pub fn load(
        &self,
        entity: &mut Entity,
        record: &EntityRecord,
        loader: &mut Loader<'_>,
    ) -> IoResult<()> {
        loader.read_base(entity, record);
        for table in self.tables {
            loader.read_fields(entity, record, table);
        }
        Ok(())
    }
}
