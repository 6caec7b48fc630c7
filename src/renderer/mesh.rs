use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::folder::format_size;
use super::{extension_of, io_failure_message, ContentHandle, ExtensionSet, PreviewContent, Renderer};

const MESH_EXTENSIONS: ExtensionSet = ExtensionSet::new(&["stl", "obj", "3ds", "ply"]);

#[derive(Debug, Default, PartialEq, Eq)]
struct MeshSummary {
    format: &'static str,
    vertices: Option<u64>,
    faces: Option<u64>,
}

/// 3D models, summarized by geometry counts read from the file.
pub struct MeshRenderer;

impl Renderer for MeshRenderer {
    fn name(&self) -> &'static str {
        "mesh"
    }

    fn can_handle(&self, path: &Path) -> bool {
        MESH_EXTENSIONS.matches(path)
    }

    fn render(&self, path: &Path) -> ContentHandle {
        let path = path.to_path_buf();
        ContentHandle::loading("Loading model", move || match summarize(&path) {
            Ok((summary, size)) => {
                let mut fields = vec![
                    ("Format".to_string(), summary.format.to_string()),
                    ("File Size".to_string(), format_size(size)),
                ];
                if let Some(vertices) = summary.vertices {
                    fields.push(("Vertices".to_string(), vertices.to_string()));
                }
                if let Some(faces) = summary.faces {
                    fields.push(("Faces".to_string(), faces.to_string()));
                }
                PreviewContent::Details {
                    title: super::file_title(&path),
                    fields,
                }
            }
            Err(err) => io_failure_message("loading model", &err),
        })
    }
}

fn summarize(path: &Path) -> std::io::Result<(MeshSummary, u64)> {
    let size = fs::metadata(path)?.len();
    let summary = match extension_of(path).as_deref() {
        Some("stl") => summarize_stl(path, size)?,
        Some("obj") => summarize_obj(path)?,
        Some("ply") => summarize_ply(path)?,
        _ => MeshSummary {
            format: "3D Studio",
            ..MeshSummary::default()
        },
    };
    Ok((summary, size))
}

fn summarize_stl(path: &Path, size: u64) -> std::io::Result<MeshSummary> {
    let bytes = fs::read(path)?;
    // Binary STL: 80-byte header, u32 triangle count, 50 bytes per triangle.
    if let Some(raw) = bytes.get(80..84) {
        let triangles = u64::from(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]));
        if 84 + triangles * 50 == size {
            return Ok(MeshSummary {
                format: "STL (binary)",
                vertices: Some(triangles * 3),
                faces: Some(triangles),
            });
        }
    }
    let facets = String::from_utf8_lossy(&bytes)
        .lines()
        .filter(|line| line.trim_start().starts_with("facet"))
        .count() as u64;
    Ok(MeshSummary {
        format: "STL (ASCII)",
        vertices: Some(facets * 3),
        faces: Some(facets),
    })
}

fn summarize_obj(path: &Path) -> std::io::Result<MeshSummary> {
    let mut summary = MeshSummary {
        format: "Wavefront OBJ",
        vertices: Some(0),
        faces: Some(0),
    };
    for line in BufReader::new(fs::File::open(path)?).lines() {
        let line = line?;
        let counter = match line.split_whitespace().next() {
            Some("v") => summary.vertices.as_mut(),
            Some("f") => summary.faces.as_mut(),
            _ => None,
        };
        if let Some(counter) = counter {
            *counter += 1;
        }
    }
    Ok(summary)
}

fn summarize_ply(path: &Path) -> std::io::Result<MeshSummary> {
    let mut summary = MeshSummary {
        format: "PLY",
        ..MeshSummary::default()
    };
    for line in BufReader::new(fs::File::open(path)?).split(b'\n') {
        let line = String::from_utf8_lossy(&line?).trim().to_string();
        if line == "end_header" {
            break;
        }
        let mut words = line.split_whitespace();
        if words.next() != Some("element") {
            continue;
        }
        let (kind, count) = (words.next(), words.next().and_then(|n| n.parse().ok()));
        match kind {
            Some("vertex") => summary.vertices = count,
            Some("face") => summary.faces = count,
            _ => {}
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts_obj_vertices_and_faces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tri.obj");
        fs::write(&path, "# tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1 2 3\n").expect("write");

        let (summary, _) = summarize(&path).expect("summary");
        assert_eq!(
            summary,
            MeshSummary {
                format: "Wavefront OBJ",
                vertices: Some(3),
                faces: Some(1),
            }
        );
    }

    #[test]
    fn recognizes_binary_stl_by_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("part.stl");
        let mut bytes = vec![0u8; 80];
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 100]);
        fs::write(&path, bytes).expect("write");

        let (summary, size) = summarize(&path).expect("summary");
        assert_eq!(size, 184);
        assert_eq!(summary.format, "STL (binary)");
        assert_eq!(summary.faces, Some(2));
    }

    #[test]
    fn reads_ply_header_elements() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cloud.ply");
        fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 8\nproperty float x\nelement face 6\nend_header\n",
        )
        .expect("write");

        let mut handle = MeshRenderer.render(&path);
        let PreviewContent::Details { fields, .. } = handle.take_loader().expect("loader").load()
        else {
            panic!("expected details");
        };
        assert!(fields.contains(&("Vertices".to_string(), "8".to_string())));
        assert!(fields.contains(&("Faces".to_string(), "6".to_string())));
    }
}
