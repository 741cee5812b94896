use anyhow::Result;
use serde::Serialize;

use crate::cmdline::CommandLine;
use crate::store::LumpLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MapInfoKind {
    /// `UMAPDEF`: defaults applied before any map definitions.
    Defaults,
    /// `UMAPINFO`
    MapInfo,
}

impl MapInfoKind {
    pub fn lump_name(self) -> &'static str {
        match self {
            MapInfoKind::Defaults => "UMAPDEF",
            MapInfoKind::MapInfo => "UMAPINFO",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapInfoPlan {
    lumps: Vec<(MapInfoKind, usize)>,
}

impl MapInfoPlan {
    pub fn lumps(&self) -> &[(MapInfoKind, usize)] {
        &self.lumps
    }
}

pub trait MapInfoSink {
    fn parse(&mut self, kind: MapInfoKind, data: &[u8]) -> Result<()>;
}

/// Every `UMAPDEF` lump in load order, then every `UMAPINFO` lump unless
/// `-nomapinfo` is given.
pub fn build_map_info_plan(cmdline: &CommandLine, store: &dyn LumpLookup) -> MapInfoPlan {
    let mut kinds = vec![MapInfoKind::Defaults];
    if !cmdline.parm_exists("-nomapinfo") {
        kinds.push(MapInfoKind::MapInfo);
    }
    let lumps = kinds
        .into_iter()
        .flat_map(|kind| {
            store
                .lumps_named(kind.lump_name())
                .into_iter()
                .map(move |index| (kind, index))
        })
        .collect();
    MapInfoPlan { lumps }
}

/// Feeds each planned lump to `sink`. A lump that fails to parse is skipped
/// with a warning.
pub fn apply_map_info(plan: &MapInfoPlan, store: &dyn LumpLookup, sink: &mut dyn MapInfoSink) {
    for &(kind, index) in plan.lumps() {
        let Some(data) = store.lump_bytes(index) else {
            continue;
        };
        if let Err(err) = sink.parse(kind, data) {
            log::warn!("{} lump #{index}: {err:#}", kind.lump_name());
        }
    }
}
