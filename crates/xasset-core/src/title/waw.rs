//! World at War (`codwaw.exe` / `codwawmp.exe`)

use crate::memory::PointerWidth;
use crate::offset::{CodeSignature, OffsetSignatureSet};
use crate::package::PackageFlavor;
use crate::pool::AssetKind;
use crate::schema::WAW_LAYOUTS;

use super::{
    GameMode, GameTitle, PlaceholderRules, PoolShape, PoolSlot, StringTableLayout, TableAddresses,
    TitleSpec, UsageHashes,
};

const SINGLE_PLAYER: &[TableAddresses] = &[TableAddresses::new(0x8DC828, 0x8DC5D0, 0x3702400)];

const MULTI_PLAYER: &[TableAddresses] = &[TableAddresses::new(0x8D0958, 0x8D06E8, 0xF66B400)];

fn signatures(mode: GameMode) -> OffsetSignatureSet {
    const POOLS: &str = "FF D2 8B F0 83 C4 04 85 F6 75";
    OffsetSignatureSet::new(format!("{} {}", GameTitle::WorldAtWar, mode))
        .with_entry("poolTable", vec![CodeSignature::absolute(POOLS, -0xD)])
        .with_entry("poolSizeTable", vec![CodeSignature::absolute(POOLS, 0x25)])
        .with_entry(
            "stringTable",
            vec![CodeSignature::absolute("F7 EE D1 FA 8B C2 C1 E8 1F", -0x9)],
        )
}

pub const SPEC: TitleSpec = TitleSpec {
    title: GameTitle::WorldAtWar,
    executables: &[
        ("codwaw.exe", GameMode::SinglePlayer),
        ("codwawmp.exe", GameMode::MultiPlayer),
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
            index: 4,
        },
        PoolSlot {
            kind: AssetKind::Model,
            index: 5,
        },
        PoolSlot {
            kind: AssetKind::Sound,
            index: 0xA,
        },
    ],
    // SP starts with "void", MP with one of the default models
    verify_names: &["void", "defaultactor", "defaultweapon"],
    strings: StringTableLayout {
        sp_stride: 12,
        mp_stride: 12,
        offset: 4,
    },
    layouts: WAW_LAYOUTS,
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
