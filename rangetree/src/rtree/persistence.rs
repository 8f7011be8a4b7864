//! Binary save/load of a whole tree.
//!
//! The stream starts with a [`FileHeader`] of seven `u32` fields, followed by
//! a pre-order dump of the nodes. Each node writes its level and entry count,
//! then for every entry its box (`min[D]`, `max[D]`) followed by either the
//! child node or the leaf payload. Everything is encoded with bincode's
//! legacy configuration (little-endian, fixed-width integers).

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::mem::size_of;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::bounding_box::BoundingBox;

use super::rtree_arena::NodeArena;
use super::rtree_config::RTreeConfig;
use super::rtree_constants::{MAGIC, MAX_DECODED_VALUE_BYTES};
use super::rtree_impl::RTree;
use super::rtree_types::{ChildRef, LeafEntry, Node, NodeId, SpatialError, SpatialResult};

/// Stream header identifying the layout a tree was saved with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    pub magic: u32,
    /// `size_of` the payload type
    pub payload_size: u32,
    pub dimensions: u32,
    /// `size_of` a stored coordinate
    pub coordinate_size: u32,
    /// `size_of` the type volumes are computed in
    pub real_size: u32,
    pub max_fill: u32,
    pub min_fill: u32,
}

impl FileHeader {
    /// Header a tree of this shape and configuration writes
    pub fn for_tree<T, const D: usize>(config: &RTreeConfig) -> Self {
        Self {
            magic: MAGIC,
            payload_size: size_of::<T>() as u32,
            dimensions: D as u32,
            coordinate_size: size_of::<f64>() as u32,
            real_size: size_of::<f64>() as u32,
            max_fill: config.max_fill() as u32,
            min_fill: config.min_fill() as u32,
        }
    }

    /// Reject a header whose fields differ from `expected`
    pub fn validate_against(&self, expected: &FileHeader) -> SpatialResult<()> {
        let fields = [
            ("magic", self.magic, expected.magic),
            ("payload size", self.payload_size, expected.payload_size),
            ("dimensions", self.dimensions, expected.dimensions),
            ("coordinate size", self.coordinate_size, expected.coordinate_size),
            ("real size", self.real_size, expected.real_size),
            ("max fill", self.max_fill, expected.max_fill),
            ("min fill", self.min_fill, expected.min_fill),
        ];
        for (name, found, wanted) in fields {
            if found != wanted {
                return Err(SpatialError::IncompatibleHeader(format!(
                    "{} mismatch: expected {}, found {}",
                    name, wanted, found
                )));
            }
        }
        Ok(())
    }
}

fn encode<W: Write, V: Serialize>(writer: &mut W, value: V) -> SpatialResult<()> {
    bincode::serde::encode_into_std_write(value, writer, bincode::config::legacy())?;
    Ok(())
}

fn decode<R: Read, V: DeserializeOwned>(reader: &mut R) -> SpatialResult<V> {
    let config = bincode::config::legacy().with_limit::<MAX_DECODED_VALUE_BYTES>();
    Ok(bincode::serde::decode_from_std_read(reader, config)?)
}

fn write_bbox<W: Write, const D: usize>(writer: &mut W, bbox: &BoundingBox<D>) -> SpatialResult<()> {
    for value in bbox.min.iter().chain(bbox.max.iter()) {
        encode(writer, value)?;
    }
    Ok(())
}

fn read_bbox<R: Read, const D: usize>(reader: &mut R) -> SpatialResult<BoundingBox<D>> {
    let mut min = [0.0; D];
    let mut max = [0.0; D];
    for value in min.iter_mut().chain(max.iter_mut()) {
        *value = decode(reader)?;
    }
    let bbox = BoundingBox::new(min, max);
    bbox.validate()
        .map_err(|e| SpatialError::Corrupted(e.to_string()))?;
    Ok(bbox)
}

impl<T, const D: usize> RTree<T, D> {
    /// Write the header and every node to `writer`
    pub fn save<W: Write>(&self, writer: &mut W) -> SpatialResult<()>
    where
        T: Serialize,
    {
        encode(writer, FileHeader::for_tree::<T, D>(&self.config))?;
        let nodes = self.save_rec(self.root, writer)?;
        writer.flush()?;
        log::debug!("saved {} nodes, height {}", nodes, self.height());
        Ok(())
    }

    fn save_rec<W: Write>(&self, node_id: NodeId, writer: &mut W) -> SpatialResult<usize>
    where
        T: Serialize,
    {
        let node = self.arena.get(node_id);
        encode(writer, node.level())?;
        encode(writer, node.len() as u32)?;

        match node {
            Node::Leaf { entries } => {
                for entry in entries {
                    write_bbox(writer, &entry.bbox)?;
                    encode(writer, &entry.data)?;
                }
                Ok(1)
            }
            Node::Internal { children, .. } => {
                let mut nodes = 1;
                for child in children {
                    write_bbox(writer, &child.bbox)?;
                    nodes += self.save_rec(child.node, writer)?;
                }
                Ok(nodes)
            }
        }
    }

    /// Replace the contents of this tree with a tree read from `reader`.
    ///
    /// The stream must have been written by a tree with the same payload
    /// type, dimension count and fill bounds. The whole stream is decoded
    /// before anything is replaced; on error the tree keeps its contents.
    pub fn load<R: Read>(&mut self, reader: &mut R) -> SpatialResult<()>
    where
        T: DeserializeOwned,
    {
        let expected = FileHeader::for_tree::<T, D>(&self.config);
        let header: FileHeader = decode(reader)?;
        if let Err(e) = header.validate_against(&expected) {
            log::warn!("rejecting tree data: {}", e);
            return Err(e);
        }

        let mut arena = NodeArena::new();
        let root = match load_rec(&mut arena, reader, &self.config, None, 0) {
            Ok(root) => root,
            Err(e) => {
                log::warn!("rejecting tree data: {}", e);
                return Err(e);
            }
        };

        self.arena = arena;
        self.root = root;
        log::debug!(
            "loaded {} nodes, height {}",
            self.arena.len(),
            self.height()
        );
        Ok(())
    }

    /// Save to a file, creating or truncating it
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SpatialResult<()>
    where
        T: Serialize,
    {
        let mut writer = BufWriter::new(File::create(path)?);
        self.save(&mut writer)
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> SpatialResult<()>
    where
        T: DeserializeOwned,
    {
        let mut reader = BufReader::new(File::open(path)?);
        self.load(&mut reader)
    }
}

fn load_rec<T, R, const D: usize>(
    arena: &mut NodeArena<T, D>,
    reader: &mut R,
    config: &RTreeConfig,
    expected_level: Option<u32>,
    depth: usize,
) -> SpatialResult<NodeId>
where
    T: DeserializeOwned,
    R: Read,
{
    if depth >= config.max_height() {
        return Err(SpatialError::Corrupted(format!(
            "tree is deeper than the maximum height {}",
            config.max_height()
        )));
    }

    let is_root = depth == 0;
    let level: u32 = decode(reader)?;
    let count: u32 = decode(reader)?;
    if let Some(expected) = expected_level {
        if level != expected {
            return Err(SpatialError::Corrupted(format!(
                "node level {} where {} was expected",
                level, expected
            )));
        }
    }
    if count as usize > config.max_fill() {
        return Err(SpatialError::Corrupted(format!(
            "node holds {} entries, max fill is {}",
            count,
            config.max_fill()
        )));
    }

    if !is_root && (count as usize) < config.min_fill() {
        return Err(SpatialError::Corrupted(format!(
            "non-root node holds {} entries, min fill is {}",
            count,
            config.min_fill()
        )));
    }
    if is_root && level > 0 && count < 2 {
        return Err(SpatialError::Corrupted(format!(
            "internal root holds {} children",
            count
        )));
    }

    if level == 0 {
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let bbox = read_bbox(reader)?;
            let data: T = decode(reader)?;
            entries.push(LeafEntry { bbox, data });
        }
        return Ok(arena.allocate(Node::Leaf { entries }));
    }

    if count == 0 {
        return Err(SpatialError::Corrupted(format!(
            "internal node at level {} has no children",
            level
        )));
    }
    let mut children = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let bbox = read_bbox(reader)?;
        let node = load_rec(arena, reader, config, Some(level - 1), depth + 1)?;
        if arena.get(node).compute_bbox() != Some(bbox) {
            return Err(SpatialError::Corrupted(format!(
                "stored box {} does not cover its child",
                bbox
            )));
        }
        children.push(ChildRef { bbox, node });
    }
    Ok(arena.allocate(Node::Internal { children, level }))
}
