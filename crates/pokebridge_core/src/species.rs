//! Species catalog keyed by the internal species index stored in records.
//!
//! Indices 1-251 match national dex numbers. 252-276 are unused placeholders
//! and 277-411 hold the Hoenn species in internal order.

use crate::gen3::variant::{FormatVariant, Title};

pub const KANTO_LAST: u16 = 151;
pub const JOHTO_LAST: u16 = 251;
pub const HOENN_FIRST: u16 = 277;
pub const HOENN_LAST: u16 = 411;

/// National dex size covered by the owned/seen bitfields.
pub const NATIONAL_DEX_SIZE: u16 = 386;

/// National numbers whose ownership unlocks a legendary flag.
pub const LEGENDARIES: [u16; 21] = [
    144, 145, 146, 150, 151, 243, 244, 245, 249, 250, 251, 377, 378, 379, 380, 381, 382, 383,
    384, 385, 386,
];

/// Pre-Hoenn species listed in the Hoenn regional dex.
pub const HOENN_DEX_OLDER: [u16; 67] = [
    25, 26, 27, 28, 37, 38, 39, 40, 41, 42, 43, 44,
    45, 54, 55, 63, 64, 65, 66, 67, 68, 72, 73, 74,
    75, 76, 81, 82, 84, 85, 88, 89, 100, 101, 109, 110,
    111, 112, 116, 117, 118, 119, 120, 121, 127, 129, 130, 169,
    170, 171, 172, 174, 177, 178, 182, 183, 184, 202, 203, 214,
    218, 219, 222, 227, 230, 231, 232,
];

static KANTO_JOHTO_NAMES: [&str; 251] = [
    "BULBASAUR", "IVYSAUR", "VENUSAUR", "CHARMANDER", "CHARMELEON", "CHARIZARD",
    "SQUIRTLE", "WARTORTLE", "BLASTOISE", "CATERPIE", "METAPOD", "BUTTERFREE",
    "WEEDLE", "KAKUNA", "BEEDRILL", "PIDGEY", "PIDGEOTTO", "PIDGEOT",
    "RATTATA", "RATICATE", "SPEAROW", "FEAROW", "EKANS", "ARBOK",
    "PIKACHU", "RAICHU", "SANDSHREW", "SANDSLASH", "NIDORAN F", "NIDORINA",
    "NIDOQUEEN", "NIDORAN M", "NIDORINO", "NIDOKING", "CLEFAIRY", "CLEFABLE",
    "VULPIX", "NINETALES", "JIGGLYPUFF", "WIGGLYTUFF", "ZUBAT", "GOLBAT",
    "ODDISH", "GLOOM", "VILEPLUME", "PARAS", "PARASECT", "VENONAT",
    "VENOMOTH", "DIGLETT", "DUGTRIO", "MEOWTH", "PERSIAN", "PSYDUCK",
    "GOLDUCK", "MANKEY", "PRIMEAPE", "GROWLITHE", "ARCANINE", "POLIWAG",
    "POLIWHIRL", "POLIWRATH", "ABRA", "KADABRA", "ALAKAZAM", "MACHOP",
    "MACHOKE", "MACHAMP", "BELLSPROUT", "WEEPINBELL", "VICTREEBEL", "TENTACOOL",
    "TENTACRUEL", "GEODUDE", "GRAVELER", "GOLEM", "PONYTA", "RAPIDASH",
    "SLOWPOKE", "SLOWBRO", "MAGNEMITE", "MAGNETON", "FARFETCH'D", "DODUO",
    "DODRIO", "SEEL", "DEWGONG", "GRIMER", "MUK", "SHELLDER",
    "CLOYSTER", "GASTLY", "HAUNTER", "GENGAR", "ONIX", "DROWZEE",
    "HYPNO", "KRABBY", "KINGLER", "VOLTORB", "ELECTRODE", "EXEGGCUTE",
    "EXEGGUTOR", "CUBONE", "MAROWAK", "HITMONLEE", "HITMONCHAN", "LICKITUNG",
    "KOFFING", "WEEZING", "RHYHORN", "RHYDON", "CHANSEY", "TANGELA",
    "KANGASKHAN", "HORSEA", "SEADRA", "GOLDEEN", "SEAKING", "STARYU",
    "STARMIE", "MR.MIME", "SCYTHER", "JYNX", "ELECTABUZZ", "MAGMAR",
    "PINSIR", "TAUROS", "MAGIKARP", "GYARADOS", "LAPRAS", "DITTO",
    "EEVEE", "VAPOREON", "JOLTEON", "FLAREON", "PORYGON", "OMANYTE",
    "OMASTAR", "KABUTO", "KABUTOPS", "AERODACTYL", "SNORLAX", "ARTICUNO",
    "ZAPDOS", "MOLTRES", "DRATINI", "DRAGONAIR", "DRAGONITE", "MEWTWO",
    "MEW", "CHIKORITA", "BAYLEEF", "MEGANIUM", "CYNDAQUIL", "QUILAVA",
    "TYPHLOSION", "TOTODILE", "CROCONAW", "FERALIGATR", "SENTRET", "FURRET",
    "HOOTHOOT", "NOCTOWL", "LEDYBA", "LEDIAN", "SPINARAK", "ARIADOS",
    "CROBAT", "CHINCHOU", "LANTURN", "PICHU", "CLEFFA", "IGGLYBUFF",
    "TOGEPI", "TOGETIC", "NATU", "XATU", "MAREEP", "FLAAFFY",
    "AMPHAROS", "BELLOSSOM", "MARILL", "AZUMARILL", "SUDOWOODO", "POLITOED",
    "HOPPIP", "SKIPLOOM", "JUMPLUFF", "AIPOM", "SUNKERN", "SUNFLORA",
    "YANMA", "WOOPER", "QUAGSIRE", "ESPEON", "UMBREON", "MURKROW",
    "SLOWKING", "MISDREAVUS", "UNOWN", "WOBBUFFET", "GIRAFARIG", "PINECO",
    "FORRETRESS", "DUNSPARCE", "GLIGAR", "STEELIX", "SNUBBULL", "GRANBULL",
    "QWILFISH", "SCIZOR", "SHUCKLE", "HERACROSS", "SNEASEL", "TEDDIURSA",
    "URSARING", "SLUGMA", "MAGCARGO", "SWINUB", "PILOSWINE", "CORSOLA",
    "REMORAID", "OCTILLERY", "DELIBIRD", "MANTINE", "SKARMORY", "HOUNDOUR",
    "HOUNDOOM", "KINGDRA", "PHANPY", "DONPHAN", "PORYGON2", "STANTLER",
    "SMEARGLE", "TYROGUE", "HITMONTOP", "SMOOCHUM", "ELEKID", "MAGBY",
    "MILTANK", "BLISSEY", "RAIKOU", "ENTEI", "SUICUNE", "LARVITAR",
    "PUPITAR", "TYRANITAR", "LUGIA", "HO-OH", "CELEBI",
];

static HOENN_NAMES: [&str; 135] = [
    "TREECKO", "GROVYLE", "SCEPTILE", "TORCHIC", "COMBUSKEN", "BLAZIKEN",
    "MUDKIP", "MARSHTOMP", "SWAMPERT", "POOCHYENA", "MIGHTYENA", "ZIGZAGOON",
    "LINOONE", "WURMPLE", "SILCOON", "BEAUTIFLY", "CASCOON", "DUSTOX",
    "LOTAD", "LOMBRE", "LUDICOLO", "SEEDOT", "NUZLEAF", "SHIFTRY",
    "NINCADA", "NINJASK", "SHEDINJA", "TAILLOW", "SWELLOW", "SHROOMISH",
    "BRELOOM", "SPINDA", "WINGULL", "PELIPPER", "SURSKIT", "MASQUERAIN",
    "WAILMER", "WAILORD", "SKITTY", "DELCATTY", "KECLEON", "BALTOY",
    "CLAYDOL", "NOSEPASS", "TORKOAL", "SABLEYE", "BARBOACH", "WHISCASH",
    "LUVDISC", "CORPHISH", "CRAWDAUNT", "FEEBAS", "MILOTIC", "CARVANHA",
    "SHARPEDO", "TRAPINCH", "VIBRAVA", "FLYGON", "MAKUHITA", "HARIYAMA",
    "ELECTRIKE", "MANECTRIC", "NUMEL", "CAMERUPT", "SPHEAL", "SEALEO",
    "WALREIN", "CACNEA", "CACTURNE", "SNORUNT", "GLALIE", "LUNATONE",
    "SOLROCK", "AZURILL", "SPOINK", "GRUMPIG", "PLUSLE", "MINUN",
    "MAWILE", "MEDITITE", "MEDICHAM", "SWABLU", "ALTARIA", "WYNAUT",
    "DUSKULL", "DUSCLOPS", "ROSELIA", "SLAKOTH", "VIGOROTH", "SLAKING",
    "GULPIN", "SWALOT", "TROPIUS", "WHISMUR", "LOUDRED", "EXPLOUD",
    "CLAMPERL", "HUNTAIL", "GOREBYSS", "ABSOL", "SHUPPET", "BANETTE",
    "SEVIPER", "ZANGOOSE", "RELICANTH", "ARON", "LAIRON", "AGGRON",
    "CASTFORM", "VOLBEAT", "ILLUMISE", "LILEEP", "CRADILY", "ANORITH",
    "ARMALDO", "RALTS", "KIRLIA", "GARDEVOIR", "BAGON", "SHELGON",
    "SALAMENCE", "BELDUM", "METANG", "METAGROSS", "REGIROCK", "REGICE",
    "REGISTEEL", "KYOGRE", "GROUDON", "RAYQUAZA", "LATIAS", "LATIOS",
    "JIRACHI", "DEOXYS", "CHIMECHO",
];

pub fn is_valid(species: u16) -> bool {
    matches!(species, 1..=JOHTO_LAST | HOENN_FIRST..=HOENN_LAST)
}

pub fn name(species: u16) -> Option<&'static str> {
    match species {
        1..=JOHTO_LAST => KANTO_JOHTO_NAMES.get(species as usize - 1).copied(),
        HOENN_FIRST..=HOENN_LAST => HOENN_NAMES.get((species - HOENN_FIRST) as usize).copied(),
        _ => None,
    }
}

pub fn display_name(species: u16) -> String {
    match name(species) {
        Some(name) => name.to_string(),
        None => format!("#{species}"),
    }
}

pub fn in_regional_dex(variant: FormatVariant, species: u16) -> bool {
    match variant {
        FormatVariant::FireRedLeafGreen => (1..=KANTO_LAST).contains(&species),
        FormatVariant::RubySapphire | FormatVariant::Emerald => {
            (HOENN_FIRST..=HOENN_LAST).contains(&species) || HOENN_DEX_OLDER.contains(&species)
        }
    }
}

/// Whether `title` can hold `species`. With the national dex unlocked every
/// valid species is accepted.
pub fn available_in(title: Title, species: u16, national_dex: bool) -> bool {
    if !is_valid(species) {
        return false;
    }
    national_dex || in_regional_dex(title.variant(), species)
}
