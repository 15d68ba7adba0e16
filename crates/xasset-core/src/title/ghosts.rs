//! Ghosts (`iw6sp64_ship.exe` / `iw6mp64_ship.exe`, 64-bit)

use crate::memory::PointerWidth;
use crate::offset::{CodeSignature, OffsetSignatureSet};
use crate::package::PackageFlavor;
use crate::pool::AssetKind;
use crate::schema::GHOSTS_LAYOUTS;

use super::{
    GameMode, GameTitle, PlaceholderRules, PoolShape, PoolSlot, StringTableLayout, TableAddresses,
    TitleSpec, UsageHashes,
};

const SINGLE_PLAYER: &[TableAddresses] =
    &[TableAddresses::new(0x14086DCB0, 0x14086DBB0, 0x144E21C00).with_package_table(0x14353D780)];

const MULTI_PLAYER: &[TableAddresses] = &[
    TableAddresses::new(0x1409E4F20, 0x1409E4E20, 0x1446BAD00).with_package_table(0x143B03800),
    TableAddresses::new(0x1409E6F20, 0x1409E6E20, 0x1446BCD00).with_package_table(0x143B05800),
];

fn signatures(mode: GameMode) -> OffsetSignatureSet {
    const POOLS: &str = "48 8B D8 48 85 C0 75 ?? F0 FF 0D";
    // Table operands are 32-bit offsets from the module base
    let sizes = match mode {
        GameMode::SinglePlayer => 0x26,
        GameMode::MultiPlayer | GameMode::Zombies => 0x1E,
    };
    let strings = match mode {
        GameMode::SinglePlayer => {
            CodeSignature::relative("44 8B C3 41 8B C0 48 8D 35 ?? ?? ?? ?? 48", 6, 3, 7)
        }
        GameMode::MultiPlayer | GameMode::Zombies => {
            CodeSignature::relative("55 56 57 48 83 EC 30 48 8B F9 E8", 0xF, 3, 7)
        }
    };
    OffsetSignatureSet::new(format!("{} {}", GameTitle::Ghosts, mode))
        .with_entry(
            "poolTable",
            vec![CodeSignature::absolute(POOLS, -0xB).with_module_base()],
        )
        .with_entry(
            "poolSizeTable",
            vec![CodeSignature::absolute(POOLS, sizes).with_module_base()],
        )
        .with_entry("stringTable", vec![strings])
}

pub const SPEC: TitleSpec = TitleSpec {
    title: GameTitle::Ghosts,
    executables: &[
        ("iw6sp64_ship.exe", GameMode::SinglePlayer),
        ("iw6mp64_ship.exe", GameMode::MultiPlayer),
    ],
    pointer: PointerWidth::U64,
    module_relative: false,
    single_player: SINGLE_PLAYER,
    multi_player: MULTI_PLAYER,
    zombies: &[],
    signatures,
    // Pools open with an 8 byte free-list head
    pool_shape: PoolShape::PointerArray { header_skip: 8 },
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
            kind: AssetKind::Image,
            index: 0xD,
        },
        PoolSlot {
            kind: AssetKind::Sound,
            index: 0x12,
        },
    ],
    verify_names: &["void"],
    strings: StringTableLayout {
        sp_stride: 16,
        mp_stride: 12,
        offset: 4,
    },
    layouts: GHOSTS_LAYOUTS,
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
    package: PackageFlavor::None,
};
