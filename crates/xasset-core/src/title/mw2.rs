//! Modern Warfare 2 (`iw4sp.exe` / `iw4mp.exe`)

use crate::memory::PointerWidth;
use crate::offset::{CodeSignature, OffsetSignatureSet};
use crate::package::PackageFlavor;
use crate::pool::AssetKind;
use crate::schema::MW2_LAYOUTS;

use super::{
    GameMode, GameTitle, PlaceholderRules, PoolShape, PoolSlot, StringTableLayout, TableAddresses,
    TitleSpec, UsageHashes,
};

const SINGLE_PLAYER: &[TableAddresses] = &[TableAddresses::new(0x7307F8, 0x730510, 0x1589C80)];

const MULTI_PLAYER: &[TableAddresses] = &[TableAddresses::new(0x6F81D0, 0x6F7F08, 0x6F9F00)];

/// String table lookup shared with Modern Warfare 3
pub(super) const STRING_TABLE_PATTERN: &str = "8B 44 24 04 2B 05 ?? ?? ?? ?? 3D ?? ?? ?? ?? 1B";

fn signatures(mode: GameMode) -> OffsetSignatureSet {
    const POOLS: &str = "56 51 FF D2 8B F0 83 C4 04 85 F6";
    // The size table load sits further away in the MP build
    let sizes = match mode {
        GameMode::SinglePlayer => 0x30,
        GameMode::MultiPlayer | GameMode::Zombies => 0x46,
    };
    OffsetSignatureSet::new(format!("{} {}", GameTitle::ModernWarfare2, mode))
        .with_entry("poolTable", vec![CodeSignature::absolute(POOLS, -0xB)])
        .with_entry("poolSizeTable", vec![CodeSignature::absolute(POOLS, sizes)])
        .with_entry(
            "stringTable",
            vec![CodeSignature::absolute(STRING_TABLE_PATTERN, 6).with_deref()],
        )
}

pub const SPEC: TitleSpec = TitleSpec {
    title: GameTitle::ModernWarfare2,
    executables: &[
        ("iw4sp.exe", GameMode::SinglePlayer),
        ("iw4mp.exe", GameMode::MultiPlayer),
    ],
    pointer: PointerWidth::U32,
    module_relative: false,
    single_player: SINGLE_PLAYER,
    multi_player: MULTI_PLAYER,
    zombies: &[],
    signatures,
    pool_shape: PoolShape::PointerArray { header_skip: 4 },
    pools: &[
        PoolSlot {
            kind: AssetKind::Animation,
            index: 2,
        },
        PoolSlot {
            kind: AssetKind::Model,
            index: 4,
        },
        PoolSlot {
            kind: AssetKind::Sound,
            index: 0xD,
        },
    ],
    verify_names: &["void"],
    strings: StringTableLayout {
        sp_stride: 16,
        mp_stride: 12,
        offset: 4,
    },
    layouts: MW2_LAYOUTS,
    placeholders: PlaceholderRules {
        anim_sentinels: &["void"],
        model_sentinels: &["void"],
        model_prefixes: &[],
    },
    usage_hashes: UsageHashes {
        diffuse: 0xA0AB1041,
        normal: 0x59D30D0F,
        specular: 0x34ECCCB3,
    },
    package: PackageFlavor::Iwd,
};
