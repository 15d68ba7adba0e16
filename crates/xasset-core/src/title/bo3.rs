//! Black Ops 3 (`blackops3.exe`, 64-bit, single player only)

use crate::memory::PointerWidth;
use crate::offset::{CodeSignature, OffsetSignatureSet};
use crate::package::PackageFlavor;
use crate::pool::AssetKind;
use crate::schema::{BO3_LAYOUTS, u32_at, u64_at};

use super::{
    GameMode, GameTitle, PlaceholderRules, PoolShape, PoolSlot, StringTableLayout, TableAddresses,
    TitleSpec, UsageHashes,
};

// Relative to the module base, one entry per known patch
const SINGLE_PLAYER: &[TableAddresses] = &[
    TableAddresses::new(0x93FA290, 0, 0x4D4F100),
    TableAddresses::new(0x830E090, 0, 0x3C62F00),
    TableAddresses::new(0x82A1780, 0, 0x3CEFF00),
    TableAddresses::new(0x8194410, 0, 0x3BE2D80),
    TableAddresses::new(0x8130400, 0, 0x3B7ED80),
    TableAddresses::new(0x8148970, 0, 0x3B8B300),
    TableAddresses::new(0x7F76EF0, 0, 0x39B9880),
    TableAddresses::new(0x7F72E60, 0, 0x39B5800),
];

fn signatures(mode: GameMode) -> OffsetSignatureSet {
    OffsetSignatureSet::new(format!("{} {}", GameTitle::BlackOps3, mode))
        .with_entry(
            "poolTable",
            vec![CodeSignature::relative(
                "63 C1 48 8D 05 ?? ?? ?? ?? 49 C1 E0 ?? 4C 03 C0",
                2,
                3,
                7,
            )],
        )
        .with_entry(
            "stringTable",
            vec![CodeSignature::relative(
                "4C 03 F6 33 DB 49 ?? ?? 8B D3 8D 7B",
                0x1A,
                3,
                7,
            )],
        )
}

pub const SPEC: TitleSpec = TitleSpec {
    title: GameTitle::BlackOps3,
    executables: &[("blackops3.exe", GameMode::SinglePlayer)],
    pointer: PointerWidth::U64,
    module_relative: true,
    single_player: SINGLE_PLAYER,
    multi_player: &[],
    zombies: &[],
    signatures,
    pool_shape: PoolShape::PoolData {
        record_size: 0x20,
        pool: u64_at(0),
        capacity: u32_at(0xC),
    },
    pools: &[
        PoolSlot {
            kind: AssetKind::Animation,
            index: 3,
        },
        PoolSlot {
            kind: AssetKind::Model,
            index: 4,
        },
        PoolSlot {
            kind: AssetKind::Image,
            index: 9,
        },
        PoolSlot {
            kind: AssetKind::RawFile,
            index: 0x2F,
        },
    ],
    verify_names: &["void"],
    strings: StringTableLayout {
        sp_stride: 28,
        mp_stride: 28,
        offset: 4,
    },
    layouts: BO3_LAYOUTS,
    placeholders: PlaceholderRules {
        anim_sentinels: &["void"],
        model_sentinels: &["void"],
        // Brush models have no exportable geometry
        model_prefixes: &["*"],
    },
    usage_hashes: UsageHashes {
        diffuse: 0xA0AB1041,
        normal: 0x59D30D0F,
        specular: 0xEC443804,
    },
    package: PackageFlavor::Xpak,
};
