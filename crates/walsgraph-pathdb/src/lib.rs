//! PathDB: compact property-graph storage
//!
//! Key ideas:
//! 1. **String Interning**: all strings stored once, referenced by u32 ID
//! 2. **Columnar Attributes**: one column per attribute name
//! 3. **Bitmap Filters**: type and attribute filters produce Roaring bitmaps
//!    that are intersected, so conjunctive queries never scan twice
//! 4. **Keyed Upsert**: a `(type, key)` index makes writes idempotent
//!
//! The store keeps flat nodes only; the graph model has no edges.
//!
//! ## Module Organization
//!
//! - `query`: the structured query IR (filters, projection, grouping) and
//!   its evaluation

pub mod query;

use anyhow::{anyhow, Result};
use dashmap::DashMap;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

pub use query::{AttrPredicate, OrderBy, OrderKey, PathQuery, Projection, QueryRows};

// ============================================================================
// String Interning (Compact String Storage)
// ============================================================================

/// Interned string ID (4 bytes instead of 24+ for String)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct StrId(u32);

impl StrId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

/// String interner: maps strings to compact IDs
#[derive(Debug)]
pub struct StringInterner {
    /// String to ID mapping
    str_to_id: DashMap<String, StrId>,
    /// ID to string mapping (for reverse lookup)
    id_to_str: DashMap<StrId, String>,
    /// Next available ID
    next_id: AtomicU32,
}

impl StringInterner {
    pub fn new() -> Self {
        Self {
            str_to_id: DashMap::new(),
            id_to_str: DashMap::new(),
            next_id: AtomicU32::new(0),
        }
    }

    /// Intern a string, returning its ID
    pub fn intern(&self, s: &str) -> StrId {
        if let Some(id) = self.str_to_id.get(s) {
            return *id;
        }

        let id = StrId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.str_to_id.insert(s.to_string(), id);
        self.id_to_str.insert(id, s.to_string());
        id
    }

    /// Look up an existing ID for a string without inserting.
    pub fn id_of(&self, s: &str) -> Option<StrId> {
        self.str_to_id.get(s).map(|id| *id)
    }

    /// Look up string by ID
    pub fn lookup(&self, id: StrId) -> Option<String> {
        self.id_to_str.get(&id).map(|s| s.clone())
    }

    pub fn len(&self) -> usize {
        self.next_id.load(Ordering::SeqCst) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let strings: Vec<String> = (0..self.next_id.load(Ordering::SeqCst))
            .filter_map(|i| self.id_to_str.get(&StrId(i)).map(|s| s.clone()))
            .collect();
        Ok(bincode::serialize(&strings)?)
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let strings: Vec<String> = bincode::deserialize(bytes)?;
        let interner = Self::new();
        for s in strings {
            interner.intern(&s);
        }
        Ok(interner)
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Entity Storage (Columnar)
// ============================================================================

/// Entity view with resolved strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityView {
    pub id: u32,
    pub entity_type: String,
    pub attrs: HashMap<String, String>,
}

/// Columnar entity storage
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EntityStore {
    /// Type column: entity_id -> type_id
    types: Vec<StrId>,
    /// Attribute columns: attr_name -> (entity_id -> value)
    attrs: HashMap<StrId, HashMap<u32, StrId>>,
    /// Type index: type_id -> bitmap of entity IDs
    type_index: HashMap<StrId, RoaringBitmap>,
    /// Key index: (type_id, key) -> entity ID
    key_index: HashMap<(StrId, StrId), u32>,
    /// Next entity ID
    next_id: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities stored.
    pub fn len(&self) -> usize {
        self.next_id as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next_id == 0
    }

    /// Add an entity
    pub fn add(&mut self, type_id: StrId, attrs: Vec<(StrId, StrId)>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;

        self.types.push(type_id);
        self.type_index
            .entry(type_id)
            .or_insert_with(RoaringBitmap::new)
            .insert(id);
        self.set_attrs(id, attrs);
        id
    }

    /// Replace every attribute of an existing entity.
    fn replace_attrs(&mut self, entity_id: u32, attrs: Vec<(StrId, StrId)>) {
        for col in self.attrs.values_mut() {
            col.remove(&entity_id);
        }
        self.attrs.retain(|_, col| !col.is_empty());
        self.set_attrs(entity_id, attrs);
    }

    fn set_attrs(&mut self, entity_id: u32, attrs: Vec<(StrId, StrId)>) {
        for (attr_name, attr_value) in attrs {
            self.attrs
                .entry(attr_name)
                .or_insert_with(HashMap::new)
                .insert(entity_id, attr_value);
        }
    }

    /// Get entities by type (returns bitmap)
    pub fn by_type(&self, type_id: StrId) -> Option<&RoaringBitmap> {
        self.type_index.get(&type_id)
    }

    /// Get entity type
    pub fn get_type(&self, entity_id: u32) -> Option<StrId> {
        self.types.get(entity_id as usize).copied()
    }

    /// Get attribute value
    pub fn get_attr(&self, entity_id: u32, attr_name: StrId) -> Option<StrId> {
        self.attrs.get(&attr_name)?.get(&entity_id).copied()
    }

    /// Find all entities where `attr_name == value`.
    pub fn entities_with_attr_value(&self, attr_name: StrId, value: StrId) -> RoaringBitmap {
        let mut out = RoaringBitmap::new();
        let Some(col) = self.attrs.get(&attr_name) else {
            return out;
        };
        for (&entity_id, &v) in col {
            if v == value {
                out.insert(entity_id);
            }
        }
        out
    }

    /// Find all entities that have `attr_name` set at all.
    pub fn entities_with_attr(&self, attr_name: StrId) -> RoaringBitmap {
        self.attrs
            .get(&attr_name)
            .map(|col| col.keys().copied().collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// PathDB: The Complete Database
// ============================================================================

/// PathDB: compact keyed property-graph store
#[derive(Debug, Default)]
pub struct PathDB {
    /// String interner for compact storage
    pub interner: StringInterner,
    /// Entity storage
    pub entities: EntityStore,
}

const MAGIC: &[u8; 4] = b"WGDB";
const FORMAT_VERSION: u32 = 1;

impl PathDB {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities of any type.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities of `type_name`.
    pub fn count_of_type(&self, type_name: &str) -> usize {
        self.find_by_type(type_name)
            .map_or(0, |ids| ids.len() as usize)
    }

    /// Insert or fully replace the entity identified by `(type_name, key)`.
    ///
    /// Re-running with the same key and attributes leaves the store in the
    /// same state; attributes missing from `attrs` are removed.
    pub fn upsert_entity(
        &mut self,
        type_name: &str,
        key: &str,
        attrs: Vec<(&str, &str)>,
    ) -> Result<u32> {
        if key.trim().is_empty() {
            return Err(anyhow!("cannot upsert `{type_name}` with an empty key"));
        }
        let type_id = self.interner.intern(type_name);
        let key_id = self.interner.intern(key);
        let interned = self.intern_attrs(attrs);

        if let Some(&entity_id) = self.entities.key_index.get(&(type_id, key_id)) {
            self.entities.replace_attrs(entity_id, interned);
            return Ok(entity_id);
        }

        let entity_id = self.entities.add(type_id, interned);
        self.entities.key_index.insert((type_id, key_id), entity_id);
        Ok(entity_id)
    }

    /// Remove every entity. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entities.len();
        self.entities = EntityStore::new();
        self.interner = StringInterner::new();
        removed
    }

    fn intern_attrs(&self, attrs: Vec<(&str, &str)>) -> Vec<(StrId, StrId)> {
        attrs
            .into_iter()
            .map(|(k, v)| (self.interner.intern(k), self.interner.intern(v)))
            .collect()
    }

    // ========================================================================
    // Query Operations
    // ========================================================================

    /// Find entities by type (bitmap result for efficient joins)
    pub fn find_by_type(&self, type_name: &str) -> Option<&RoaringBitmap> {
        let type_id = self.interner.id_of(type_name)?;
        self.entities.by_type(type_id)
    }

    /// Find the entity stored under `(type_name, key)`.
    pub fn find_by_key(&self, type_name: &str, key: &str) -> Option<u32> {
        let type_id = self.interner.id_of(type_name)?;
        let key_id = self.interner.id_of(key)?;
        self.entities.key_index.get(&(type_id, key_id)).copied()
    }

    /// Find entities where `attr(key) == value` (exact, case-sensitive).
    pub fn entities_with_attr_value(&self, key: &str, value: &str) -> RoaringBitmap {
        let (Some(key_id), Some(value_id)) = (self.interner.id_of(key), self.interner.id_of(value))
        else {
            return RoaringBitmap::new();
        };
        self.entities.entities_with_attr_value(key_id, value_id)
    }

    /// Find entities where `attr(key)` contains `needle` (case-insensitive).
    pub fn entities_with_attr_contains(&self, key: &str, needle: &str) -> RoaringBitmap {
        let Some(key_id) = self.interner.id_of(key) else {
            return RoaringBitmap::new();
        };
        let Some(col) = self.entities.attrs.get(&key_id) else {
            return RoaringBitmap::new();
        };

        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return RoaringBitmap::new();
        }

        let mut out = RoaringBitmap::new();
        for (&entity_id, &value_id) in col {
            let Some(value) = self.interner.lookup(value_id) else {
                continue;
            };
            if value.to_lowercase().contains(&needle) {
                out.insert(entity_id);
            }
        }
        out
    }

    /// Find entities that carry attribute `key`.
    pub fn entities_with_attr(&self, key: &str) -> RoaringBitmap {
        let Some(key_id) = self.interner.id_of(key) else {
            return RoaringBitmap::new();
        };
        self.entities.entities_with_attr(key_id)
    }

    /// Read one attribute of one entity.
    pub fn attr(&self, entity_id: u32, key: &str) -> Option<String> {
        let key_id = self.interner.id_of(key)?;
        let value_id = self.entities.get_attr(entity_id, key_id)?;
        self.interner.lookup(value_id)
    }

    /// Attribute names present on at least one entity, sorted.
    pub fn attr_names(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .entities
            .attrs
            .keys()
            .filter_map(|id| self.interner.lookup(*id))
            .collect();
        names.into_iter().collect()
    }

    /// Resolve an entity into human-readable strings (type + attributes).
    pub fn get_entity(&self, entity_id: u32) -> Option<EntityView> {
        let type_id = self.entities.get_type(entity_id)?;
        let entity_type = self.interner.lookup(type_id)?;

        let mut attrs: HashMap<String, String> = HashMap::new();
        for (attr_name_id, col) in &self.entities.attrs {
            if let Some(value_id) = col.get(&entity_id) {
                let Some(name) = self.interner.lookup(*attr_name_id) else {
                    continue;
                };
                let Some(value) = self.interner.lookup(*value_id) else {
                    continue;
                };
                attrs.insert(name, value);
            }
        }

        Some(EntityView {
            id: entity_id,
            entity_type,
            attrs,
        })
    }

    /// Count entities of `type_name` per value of `key`.
    ///
    /// Entities without the attribute are counted under `None`, so the counts
    /// always sum to the number of entities of that type.
    pub fn group_counts(&self, type_name: &str, key: &str) -> Vec<(Option<String>, usize)> {
        let Some(ids) = self.find_by_type(type_name) else {
            return Vec::new();
        };
        let key_id = self.interner.id_of(key);
        let mut counts: HashMap<Option<StrId>, usize> = HashMap::new();
        for entity_id in ids {
            let value = key_id.and_then(|k| self.entities.get_attr(entity_id, k));
            *counts.entry(value).or_insert(0) += 1;
        }

        let mut out: Vec<(Option<String>, usize)> = counts
            .into_iter()
            .map(|(value, n)| (value.and_then(|v| self.interner.lookup(v)), n))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize to binary format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let interner_bytes = self.interner.to_bytes()?;
        let db_bytes = bincode::serialize(&self.entities)?;

        let mut result = Vec::new();
        // Header: magic number + version
        result.extend_from_slice(MAGIC);
        result.extend_from_slice(&FORMAT_VERSION.to_le_bytes());

        // Interner
        result.extend_from_slice(&(interner_bytes.len() as u64).to_le_bytes());
        result.extend_from_slice(&interner_bytes);

        // Entities
        result.extend_from_slice(&(db_bytes.len() as u64).to_le_bytes());
        result.extend_from_slice(&db_bytes);

        Ok(result)
    }

    /// Deserialize from binary format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 || &bytes[0..4] != MAGIC {
            return Err(anyhow!("Invalid PathDB file"));
        }

        let version = u32::from_le_bytes(bytes[4..8].try_into()?);
        if version != FORMAT_VERSION {
            return Err(anyhow!("Unsupported PathDB version: {}", version));
        }

        let mut offset = 8;
        let interner_bytes = read_section(bytes, &mut offset)?;
        let interner = StringInterner::from_bytes(interner_bytes)?;
        let db_bytes = read_section(bytes, &mut offset)?;
        let entities: EntityStore = bincode::deserialize(db_bytes)?;

        Ok(Self { interner, entities })
    }
}

fn read_section<'a>(bytes: &'a [u8], offset: &mut usize) -> Result<&'a [u8]> {
    let truncated = || anyhow!("truncated PathDB file");
    let header_end = offset.checked_add(8).ok_or_else(truncated)?;
    let len_bytes = bytes.get(*offset..header_end).ok_or_else(truncated)?;
    let len = usize::try_from(u64::from_le_bytes(len_bytes.try_into()?))
        .map_err(|_| truncated())?;
    let section_end = header_end.checked_add(len).ok_or_else(truncated)?;
    let section = bytes.get(header_end..section_end).ok_or_else(truncated)?;
    *offset = section_end;
    Ok(section)
}
