//! Renders snapshots of a map as Graphviz DOT, one file per step.
//!
//! Run with `RUST_LOG=avl_map=trace cargo run --example diagram -- <out dir>`
//! to also see every rotation. Turn a snapshot into a picture with
//! `dot -Tpng -o tree.png tree.dot`.

use std::fmt::{self, Display, Write as _};
use std::fs;
use std::io;
use std::path::Path;

use avl_map::AvlTreeMap;
use tracing::info;
use tracing_subscriber::EnvFilter;

// An edge source still waiting for some of its children.
struct Open {
    label: String,
    pending: Vec<&'static str>,
}

fn render<K: Display, V, C>(map: &AvlTreeMap<K, V, C>) -> Result<String, fmt::Error> {
    let mut dot = String::new();
    writeln!(dot, "digraph tree {{")?;
    writeln!(dot, "\tratio=0.5;")?;
    writeln!(dot, "\tsplines=false;")?;

    let mut edges = Vec::new();
    let mut open: Vec<Open> = Vec::new();
    map.visit(|node| {
        let label = format!("{}: {}", node.key, node.height);
        if let Some(parent) = open.last_mut() {
            let port = parent.pending.remove(0);
            edges.push(format!("\t\"{}\":{} -> \"{}\"", parent.label, port, label));
        }
        while open.last().map_or(false, |parent| parent.pending.is_empty()) {
            open.pop();
        }

        let mut pending = Vec::new();
        if node.has_left {
            pending.push("sw");
        }
        if node.has_right {
            pending.push("se");
        }
        if !pending.is_empty() {
            open.push(Open { label, pending });
        }
    });
    if map.len() == 1 {
        if let Some((key, _)) = map.first_key_value() {
            edges.push(format!("\t\"{}: 0\"", key));
        }
    }

    for edge in edges {
        writeln!(dot, "{}", edge)?;
    }
    writeln!(dot, "}}")?;
    Ok(dot)
}

fn snapshot<K: Display, V, C>(map: &AvlTreeMap<K, V, C>, dir: &Path, name: &str) -> io::Result<()> {
    let dot = render(map).map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    let path = dir.join(format!("{name}.dot"));
    fs::write(&path, dot)?;
    info!(path = %path.display(), len = map.len(), height = ?map.height(), "wrote snapshot");
    Ok(())
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = std::env::args().nth(1).unwrap_or_else(|| String::from("pics"));
    let dir = Path::new(&dir);
    fs::create_dir_all(dir)?;

    let mut map = AvlTreeMap::new();
    for (step, key) in [20, 10, 5, 7, 50, 500, 30, 25].into_iter().enumerate() {
        map.insert(key, key);
        snapshot(&map, dir, &format!("avlm{step}"))?;
    }

    for key in [28, 22] {
        map.insert(key, key);
    }
    map.remove(&28);
    for key in [33, 31] {
        map.insert(key, key);
    }
    map.remove(&31);
    for key in [32, 38] {
        map.insert(key, key);
    }
    snapshot(&map, dir, "before_remove")?;

    map.remove(&30);
    snapshot(&map, dir, "after_remove")?;

    for (key, value) in &map {
        println!("{key}: {value}");
    }
    Ok(())
}
