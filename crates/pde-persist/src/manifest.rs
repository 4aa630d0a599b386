use crate::error::PersistError;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct BlockInfo {
    pub name: String,
    pub index: u32,
    pub type_name: String,
    pub nb_rows: u64,
    pub nb_cols: u64,
    pub begin: u64,
    pub end: u64,
}

pub struct RankManifest {
    pub filename: String,
    pub rank: usize,
    pub blocks: Vec<BlockInfo>,
}

/// Writes the `cfbinxml` manifest listing every rank's file and blocks.
/// Block indices are write-order and identical across ranks.
pub fn write_manifest(path: &Path, version: u64, ranks: &[RankManifest]) -> Result<(), PersistError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    let mut root = BytesStart::new("cfbinary");
    root.push_attribute(("version", version.to_string().as_str()));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("nodes")))?;
    for rank_manifest in ranks {
        let mut node = BytesStart::new("node");
        node.push_attribute(("filename", rank_manifest.filename.as_str()));
        node.push_attribute(("rank", rank_manifest.rank.to_string().as_str()));
        writer.write_event(Event::Start(node))?;

        for block in &rank_manifest.blocks {
            let mut block_el = BytesStart::new("block");
            block_el.push_attribute(("name", block.name.as_str()));
            block_el.push_attribute(("index", block.index.to_string().as_str()));
            block_el.push_attribute(("type_name", block.type_name.as_str()));
            block_el.push_attribute(("nb_rows", block.nb_rows.to_string().as_str()));
            block_el.push_attribute(("nb_cols", block.nb_cols.to_string().as_str()));
            block_el.push_attribute(("begin", block.begin.to_string().as_str()));
            block_el.push_attribute(("end", block.end.to_string().as_str()));
            writer.write_event(Event::Empty(block_el))?;
        }

        writer.write_event(Event::End(BytesEnd::new("node")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("nodes")))?;
    writer.write_event(Event::End(BytesEnd::new("cfbinary")))?;

    let bytes = writer.into_inner().into_inner();
    std::fs::write(path, bytes).map_err(|e| crate::error::PersistError::Io { path: path.display().to_string(), source: e })?;
    Ok(())
}
