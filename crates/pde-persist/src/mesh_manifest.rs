use crate::error::PersistError;
use pde_mesh::{Region, RegionChild};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// One Entities block inside a Dictionary, as recorded in the XML manifest.
pub struct EntitiesManifest {
    pub path: String,
    pub connectivity_block_index: u32,
}

pub struct DictionaryManifest {
    pub name: String,
    pub continuous: bool,
    pub space_library: String,
    pub periodic_links: Vec<u64>,
    pub entities: Vec<EntitiesManifest>,
}

fn write_region(writer: &mut Writer<Cursor<Vec<u8>>>, region: &Region, elements_block_index: &HashMap<String, u32>) -> Result<(), PersistError> {
    let mut region_el = BytesStart::new("region");
    region_el.push_attribute(("name", region.name.as_str()));
    writer.write_event(Event::Start(region_el))?;

    for child in &region.children {
        match child {
            RegionChild::Region(sub) => write_region(writer, sub, elements_block_index)?,
            RegionChild::Entities(entities) => {
                let mut el = BytesStart::new("elements");
                el.push_attribute(("name", entities.name.as_str()));
                if let Some(idx) = elements_block_index.get(&entities.name) {
                    el.push_attribute(("block_index", idx.to_string().as_str()));
                }
                writer.write_event(Event::Empty(el))?;
            }
        }
    }

    writer.write_event(Event::End(BytesEnd::new("region")))?;
    Ok(())
}

/// Writes the mesh ("cf3mesh") manifest: dictionaries, their Entities'
/// connectivity block indices, and the region topology as nested
/// `<region>`/`<elements>` nodes.
pub fn write_mesh_manifest(
    path: &Path,
    version: u64,
    topology: &Region,
    elements_block_index: &HashMap<String, u32>,
    dictionaries: &[DictionaryManifest],
) -> Result<(), PersistError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    let mut root = BytesStart::new("cf3mesh");
    root.push_attribute(("version", version.to_string().as_str()));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("dictionaries")))?;
    for dict in dictionaries {
        let mut dict_el = BytesStart::new("dictionary");
        dict_el.push_attribute(("name", dict.name.as_str()));
        dict_el.push_attribute(("continuous", if dict.continuous { "true" } else { "false" }));
        dict_el.push_attribute(("space", dict.space_library.as_str()));
        writer.write_event(Event::Start(dict_el))?;

        if !dict.periodic_links.is_empty() {
            let links: Vec<String> = dict.periodic_links.iter().map(u64::to_string).collect();
            let mut links_el = BytesStart::new("periodic_links");
            links_el.push_attribute(("indices", links.join(",").as_str()));
            writer.write_event(Event::Empty(links_el))?;
        }

        for entities in &dict.entities {
            let mut el = BytesStart::new("entities");
            el.push_attribute(("path", entities.path.as_str()));
            el.push_attribute(("connectivity_block_index", entities.connectivity_block_index.to_string().as_str()));
            writer.write_event(Event::Empty(el))?;
        }

        writer.write_event(Event::End(BytesEnd::new("dictionary")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("dictionaries")))?;

    write_region(&mut writer, topology, elements_block_index)?;

    writer.write_event(Event::End(BytesEnd::new("cf3mesh")))?;

    let bytes = writer.into_inner().into_inner();
    std::fs::write(path, bytes).map_err(|e| PersistError::Io { path: path.display().to_string(), source: e })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pde_mesh::{BilinearQuad, Entities};
    use std::sync::Arc;

    #[test]
    fn mesh_manifest_nests_regions_and_references_block_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.cf3mesh");

        let mut topology = Region::new("domain");
        let mut volume = Entities::new("quads", Arc::new(BilinearQuad), true);
        volume.resize(1);
        topology.add_entities(volume);

        let mut elements_block_index = HashMap::new();
        elements_block_index.insert("quads".to_string(), 3u32);

        let dictionaries = vec![DictionaryManifest {
            name: "geometry".to_string(),
            continuous: true,
            space_library: "shapefunction.P1".to_string(),
            periodic_links: vec![],
            entities: vec![EntitiesManifest { path: "domain/quads".to_string(), connectivity_block_index: 2 }],
        }];

        write_mesh_manifest(&path, 1, &topology, &elements_block_index, &dictionaries).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("block_index=\"3\""));
        assert!(text.contains("connectivity_block_index=\"2\""));
    }
}
