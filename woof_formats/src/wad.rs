use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail, ensure};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memmap2::{Mmap, MmapOptions};
use serde::Serialize;

const HEADER_SIZE: usize = 12;
const ENTRY_SIZE: usize = 16;
const NAME_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WadKind {
    Iwad,
    Pwad,
    /// A loose lump file (`.lmp`) that is exposed as a single entry.
    Lump,
}

impl WadKind {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"IWAD" => Some(WadKind::Iwad),
            b"PWAD" => Some(WadKind::Pwad),
            _ => None,
        }
    }

    fn tag(self) -> &'static [u8; 4] {
        match self {
            WadKind::Iwad => b"IWAD",
            WadKind::Pwad | WadKind::Lump => b"PWAD",
        }
    }
}

/// Marker-delimited lump namespaces. Lookups by name default to `Global`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LumpNamespace {
    Global,
    Sprites,
    Flats,
    Colormaps,
}

#[derive(Debug, Clone, Serialize)]
pub struct WadEntry {
    pub name: String,
    pub offset: u64,
    pub size: u32,
    pub namespace: LumpNamespace,
}

impl WadEntry {
    pub fn data_range(&self) -> Range<usize> {
        let start = self.offset as usize;
        let end = start + self.size as usize;
        start..end
    }
}

#[derive(Debug)]
enum Backing {
    Mapped(Mmap),
    Empty,
}

impl Backing {
    fn bytes(&self) -> &[u8] {
        match self {
            Backing::Mapped(mmap) => mmap,
            Backing::Empty => &[],
        }
    }
}

#[derive(Debug)]
pub struct WadArchive {
    path: PathBuf,
    kind: WadKind,
    backing: Backing,
    entries: Vec<WadEntry>,
}

impl WadArchive {
    /// Opens a `.wad` archive, or any other file as a single lump named after
    /// its stem. Files carrying an `IWAD`/`PWAD` header are parsed as archives
    /// whatever their extension.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let has_wad_extension = path_buf
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("wad"))
            .unwrap_or(false);

        let (backing, len) = map_file(&path_buf)?;
        let tagged = backing
            .bytes()
            .get(0..4)
            .and_then(WadKind::from_tag)
            .is_some();
        if has_wad_extension || tagged {
            return WadArchive::from_backing(path_buf, backing);
        }

        let name = lump_name_from_path(&path_buf);
        let size = u32::try_from(len)
            .map_err(|_| anyhow!("lump file {} is too large", path_buf.display()))?;
        Ok(WadArchive {
            path: path_buf,
            kind: WadKind::Lump,
            backing,
            entries: vec![WadEntry {
                name,
                offset: 0,
                size,
                namespace: LumpNamespace::Global,
            }],
        })
    }

    /// Parses the header and directory regardless of the file name.
    pub fn open_wad<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let (backing, _) = map_file(&path_buf)?;
        WadArchive::from_backing(path_buf, backing)
    }

    fn from_backing(path: PathBuf, backing: Backing) -> Result<Self> {
        let (kind, entries) = parse_directory(backing.bytes())
            .with_context(|| format!("parsing WAD directory of {}", path.display()))?;
        Ok(WadArchive {
            path,
            kind,
            backing,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> WadKind {
        self.kind
    }

    pub fn entries(&self) -> &[WadEntry] {
        &self.entries
    }

    /// Last entry with the given name in the global namespace.
    pub fn find_entry(&self, name: &str) -> Option<&WadEntry> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.namespace == LumpNamespace::Global && lump_name_eq(&entry.name, name))
    }

    pub fn read_entry_bytes(&self, entry: &WadEntry) -> &[u8] {
        &self.backing.bytes()[entry.data_range()]
    }
}

fn map_file(path: &Path) -> Result<(Backing, u64)> {
    let file =
        File::open(path).with_context(|| format!("opening WAD file at {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("reading metadata of {}", path.display()))?
        .len();
    if len == 0 {
        return Ok((Backing::Empty, 0));
    }
    let mmap = unsafe { MmapOptions::new().map(&file) }
        .with_context(|| format!("memory-mapping {}", path.display()))?;
    Ok((Backing::Mapped(mmap), len))
}

/// Header tag plus directory entries. An unknown tag is accepted as a PWAD;
/// callers that care about the `IWAD` tag check `kind()` themselves.
fn parse_directory(bytes: &[u8]) -> Result<(WadKind, Vec<WadEntry>)> {
    ensure!(
        bytes.len() >= HEADER_SIZE,
        "WAD file is too small to contain a header"
    );

    let kind = WadKind::from_tag(&bytes[0..4]).unwrap_or(WadKind::Pwad);
    let mut header = Cursor::new(&bytes[4..HEADER_SIZE]);
    let num_lumps = header.read_i32::<LittleEndian>()?;
    let table_offset = header.read_i32::<LittleEndian>()?;

    if num_lumps < 0 || table_offset < 0 {
        bail!("WAD header has negative lump count or directory offset");
    }
    let num_lumps = num_lumps as usize;
    let table_offset = table_offset as usize;

    let table_len = num_lumps
        .checked_mul(ENTRY_SIZE)
        .ok_or_else(|| anyhow!("WAD lump count overflow"))?;
    let table_end = table_offset
        .checked_add(table_len)
        .ok_or_else(|| anyhow!("WAD directory offset overflow"))?;
    ensure!(
        table_end <= bytes.len(),
        "WAD directory extends beyond end of file"
    );

    let mut entries = Vec::with_capacity(num_lumps);
    let mut namespace = LumpNamespace::Global;
    let mut cursor = Cursor::new(&bytes[table_offset..table_end]);

    for index in 0..num_lumps {
        let offset = cursor.read_i32::<LittleEndian>()?;
        let size = cursor.read_i32::<LittleEndian>()?;
        let mut raw_name = [0u8; NAME_LEN];
        cursor.read_exact(&mut raw_name)?;
        let name = decode_name(&raw_name);

        ensure!(
            offset >= 0 && size >= 0,
            "WAD entry {index} ({name}) has a negative offset or size"
        );
        let end = (offset as usize)
            .checked_add(size as usize)
            .ok_or_else(|| anyhow!("WAD entry {index} size overflow"))?;
        ensure!(
            end <= bytes.len(),
            "WAD entry {index} ({name}) data extends beyond file"
        );

        if let Some(next) = namespace_transition(&name, namespace) {
            namespace = next;
        }

        entries.push(WadEntry {
            name,
            offset: offset as u64,
            size: size as u32,
            namespace,
        });
    }

    Ok((kind, entries))
}

fn namespace_transition(name: &str, current: LumpNamespace) -> Option<LumpNamespace> {
    let upper = name.to_ascii_uppercase();
    match upper.as_str() {
        "S_START" | "SS_START" => Some(LumpNamespace::Sprites),
        "F_START" | "FF_START" => Some(LumpNamespace::Flats),
        "C_START" => Some(LumpNamespace::Colormaps),
        "S_END" | "SS_END" if current == LumpNamespace::Sprites => Some(LumpNamespace::Global),
        "F_END" | "FF_END" if current == LumpNamespace::Flats => Some(LumpNamespace::Global),
        "C_END" if current == LumpNamespace::Colormaps => Some(LumpNamespace::Global),
        _ => None,
    }
}

fn decode_name(raw: &[u8; NAME_LEN]) -> String {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    String::from_utf8_lossy(&raw[..len]).into_owned()
}

fn lump_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.chars().take(NAME_LEN).collect::<String>().to_ascii_uppercase()
}

/// Lump names compare case-insensitively over at most eight characters.
pub fn lump_name_eq(a: &str, b: &str) -> bool {
    let a = &a.as_bytes()[..a.len().min(NAME_LEN)];
    let b = &b.as_bytes()[..b.len().min(NAME_LEN)];
    a.eq_ignore_ascii_case(b)
}

/// Writes a minimal WAD with the lumps laid out back to back after the header
/// and the directory at the end.
pub fn write_wad<P: AsRef<Path>>(path: P, kind: WadKind, lumps: &[(&str, &[u8])]) -> Result<()> {
    let path = path.as_ref();
    let mut data = Vec::new();
    data.extend_from_slice(kind.tag());
    data.write_i32::<LittleEndian>(lumps.len() as i32)?;
    data.write_i32::<LittleEndian>(0)?;

    let mut directory = Vec::with_capacity(lumps.len() * ENTRY_SIZE);
    for (name, bytes) in lumps {
        ensure!(name.len() <= NAME_LEN, "lump name {name} longer than 8 bytes");
        directory.write_i32::<LittleEndian>(data.len() as i32)?;
        directory.write_i32::<LittleEndian>(bytes.len() as i32)?;
        let mut raw_name = [0u8; NAME_LEN];
        raw_name[..name.len()].copy_from_slice(name.as_bytes());
        directory.extend_from_slice(&raw_name);
        data.extend_from_slice(bytes);
    }

    let table_offset = data.len() as i32;
    data[8..12].copy_from_slice(&table_offset.to_le_bytes());
    data.extend_from_slice(&directory);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_written_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wad");
        write_wad(
            &path,
            WadKind::Iwad,
            &[("PLAYPAL", b"pal"), ("E1M1", b""), ("DEHACKED", b"Thing 1")],
        )
        .unwrap();

        let archive = WadArchive::open(&path).unwrap();
        assert_eq!(archive.kind(), WadKind::Iwad);
        assert_eq!(archive.entries().len(), 3);
        let deh = archive.find_entry("dehacked").unwrap();
        assert_eq!(archive.read_entry_bytes(deh), b"Thing 1");
        assert_eq!(archive.entries()[0].offset, HEADER_SIZE as u64);
    }

    #[test]
    fn tracks_sprite_namespace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sprites.wad");
        write_wad(
            &path,
            WadKind::Pwad,
            &[("S_START", b""), ("TROOA1", b"x"), ("S_END", b""), ("TROOA1", b"y")],
        )
        .unwrap();

        let archive = WadArchive::open(&path).unwrap();
        let namespaces: Vec<_> = archive.entries().iter().map(|e| e.namespace).collect();
        assert_eq!(
            namespaces,
            vec![
                LumpNamespace::Sprites,
                LumpNamespace::Sprites,
                LumpNamespace::Global,
                LumpNamespace::Global
            ]
        );
        let global = archive.find_entry("trooa1").unwrap();
        assert_eq!(archive.read_entry_bytes(global), b"y");
    }

    #[test]
    fn loose_lump_file_becomes_single_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("demo1.lmp");
        fs::write(&path, b"demo-bytes").unwrap();

        let archive = WadArchive::open(&path).unwrap();
        assert_eq!(archive.kind(), WadKind::Lump);
        assert_eq!(archive.entries()[0].name, "DEMO1");
        assert_eq!(archive.read_entry_bytes(&archive.entries()[0]), b"demo-bytes");
    }

    #[test]
    fn tagged_archive_parses_under_any_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.iwd");
        write_wad(&path, WadKind::Iwad, &[("E1M1", b""), ("E4M1", b"")]).unwrap();

        let archive = WadArchive::open(&path).unwrap();
        assert_eq!(archive.kind(), WadKind::Iwad);
        assert_eq!(archive.entries().len(), 2);

        let archive = WadArchive::open_wad(&path).unwrap();
        assert_eq!(archive.entries()[1].name, "E4M1");
    }

    #[test]
    fn open_wad_rejects_headerless_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("demo1.lmp");
        fs::write(&path, b"demo").unwrap();
        assert!(WadArchive::open_wad(&path).is_err());
    }

    #[test]
    fn rejects_truncated_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.wad");
        fs::write(&path, b"IWAD").unwrap();
        assert!(WadArchive::open(&path).is_err());

        let empty = dir.path().join("empty.wad");
        fs::write(&empty, b"").unwrap();
        assert!(WadArchive::open(&empty).is_err());
    }

    #[test]
    fn rejects_directory_past_end() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.wad");
        let mut data = Vec::new();
        data.extend_from_slice(b"PWAD");
        data.extend_from_slice(&4i32.to_le_bytes());
        data.extend_from_slice(&12i32.to_le_bytes());
        fs::write(&path, &data).unwrap();
        assert!(WadArchive::open(&path).is_err());
    }

    #[test]
    fn lump_names_compare_on_eight_characters() {
        assert!(lump_name_eq("dehacked", "DEHACKED"));
        assert!(lump_name_eq("DEHACKEDX", "dehacked"));
        assert!(!lump_name_eq("MAP01", "MAP02"));
    }
}
