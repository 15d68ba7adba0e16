//! Modern Warfare 3 (`iw5sp.exe` / `iw5mp.exe`)

use crate::memory::PointerWidth;
use crate::offset::{CodeSignature, OffsetSignatureSet};
use crate::package::PackageFlavor;
use crate::pool::AssetKind;
use crate::schema::MW3_LAYOUTS;

use super::mw2::STRING_TABLE_PATTERN;
use super::{
    GameMode, GameTitle, PlaceholderRules, PoolShape, PoolSlot, StringTableLayout, TableAddresses,
    TitleSpec, UsageHashes,
};

const SINGLE_PLAYER: &[TableAddresses] = &[TableAddresses::new(0x92AD20, 0x92AA40, 0x186DA00)];

const MULTI_PLAYER: &[TableAddresses] = &[
    TableAddresses::new(0x8AB258, 0x8AAF78, 0x1D6FF00),
    TableAddresses::new(0x8A7258, 0x8A6F78, 0x1D6BF00),
];

fn signatures(mode: GameMode) -> OffsetSignatureSet {
    const POOLS: &str = "FF D1 8B F8 83 C4 04 85 FF 75";
    OffsetSignatureSet::new(format!("{} {}", GameTitle::ModernWarfare3, mode))
        .with_entry("poolTable", vec![CodeSignature::absolute(POOLS, -0xD)])
        .with_entry("poolSizeTable", vec![CodeSignature::absolute(POOLS, 0x2A)])
        .with_entry(
            "stringTable",
            vec![CodeSignature::absolute(STRING_TABLE_PATTERN, 6).with_deref()],
        )
}

pub const SPEC: TitleSpec = TitleSpec {
    title: GameTitle::ModernWarfare3,
    executables: &[
        ("iw5sp.exe", GameMode::SinglePlayer),
        ("iw5mp.exe", GameMode::MultiPlayer),
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
    layouts: MW3_LAYOUTS,
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
