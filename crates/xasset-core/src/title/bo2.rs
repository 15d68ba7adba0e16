//! Black Ops 2 (`t6sp.exe` / `t6mp.exe` / `t6zm.exe`)

use crate::memory::PointerWidth;
use crate::offset::{CodeSignature, OffsetSignatureSet};
use crate::package::PackageFlavor;
use crate::pool::AssetKind;
use crate::schema::BO2_LAYOUTS;

use super::{
    GameMode, GameTitle, PlaceholderRules, PoolShape, PoolSlot, StringTableLayout, TableAddresses,
    TitleSpec, UsageHashes,
};

const SINGLE_PLAYER: &[TableAddresses] = &[TableAddresses::new(0xBD46B8, 0xBD42F8, 0x2D44280)];

const MULTI_PLAYER: &[TableAddresses] = &[TableAddresses::new(0xD4B340, 0xD4AF80, 0x2C22F80)];

const ZOMBIES: &[TableAddresses] = &[TableAddresses::new(0xD41240, 0xD40E80, 0x2BF8880)];

// One code path in every executable
fn signatures(mode: GameMode) -> OffsetSignatureSet {
    const POOLS: &str = "56 51 FF D2 8B F0 83 C4 04 85 F6";
    OffsetSignatureSet::new(format!("{} {}", GameTitle::BlackOps2, mode))
        .with_entry("poolTable", vec![CodeSignature::absolute(POOLS, -0xB)])
        .with_entry("poolSizeTable", vec![CodeSignature::absolute(POOLS, 0x3B)])
        .with_entry(
            "stringTable",
            vec![CodeSignature::absolute(
                "33 C9 66 89 0C 10 83 C0 02 83 F8 20",
                -0x2E,
            )],
        )
}

pub const SPEC: TitleSpec = TitleSpec {
    title: GameTitle::BlackOps2,
    executables: &[
        ("t6sp.exe", GameMode::SinglePlayer),
        ("t6mp.exe", GameMode::MultiPlayer),
        ("t6zm.exe", GameMode::Zombies),
    ],
    pointer: PointerWidth::U32,
    module_relative: false,
    single_player: SINGLE_PLAYER,
    multi_player: MULTI_PLAYER,
    zombies: ZOMBIES,
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
            kind: AssetKind::RawFile,
            index: 0x29,
        },
    ],
    verify_names: &["defaultvehicle"],
    strings: StringTableLayout {
        sp_stride: 24,
        mp_stride: 24,
        offset: 4,
    },
    layouts: BO2_LAYOUTS,
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
    package: PackageFlavor::Ipak,
};
