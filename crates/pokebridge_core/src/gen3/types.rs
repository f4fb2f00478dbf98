// Save image constants
pub const SAVE_SIZE: usize = 0x20000;
pub const SLOT_SIZE: usize = 0xE000;
pub const SECTION_SIZE: usize = 0x1000;
pub const SECTION_COUNT: usize = 14;

// Section footer
pub const FOOTER_ID_OFFSET: usize = 0xFF4;
pub const FOOTER_CHECKSUM_OFFSET: usize = 0xFF6;
pub const FOOTER_SIGNATURE_OFFSET: usize = 0xFF8;
pub const FOOTER_COUNTER_OFFSET: usize = 0xFFC;
pub const SECTION_SIGNATURE: u32 = 0x0801_2025;

/// Bytes covered by the checksum, indexed by section id.
pub const SECTION_PAYLOAD_SIZES: [usize; SECTION_COUNT] = [
    3884, // trainer info
    3968, // team / items
    3968, // game state
    3968, // misc data
    3848, // rival info
    3968, // PC buffer A
    3968, // PC buffer B
    3968, // PC buffer C
    3968, // PC buffer D
    3968, // PC buffer E
    3968, // PC buffer F
    3968, // PC buffer G
    3968, // PC buffer H
    2000, // PC buffer I
];

pub const TRAINER_SECTION: u16 = 0;

// Trainer info (section 0), shared by every variant
pub const TRAINER_NAME_OFFSET: usize = 0x00;
pub const TRAINER_NAME_LEN: usize = 8;
pub const TRAINER_GENDER_OFFSET: usize = 0x08;
pub const TRAINER_ID_OFFSET: usize = 0x0A;
pub const PLAY_TIME_OFFSET: usize = 0x0E;
pub const DEX_OWNED_OFFSET: usize = 0x28;
pub const DEX_SEEN_OFFSET: usize = 0x5C;
pub const DEX_FLAGS_LEN: usize = 52;
pub const GAME_CODE_OFFSET: usize = 0xAC;
pub const EMERALD_ONLY_RANGE: std::ops::Range<usize> = 0x890..0xF2C;

// Event flags
pub const EVENT_FLAGS_LEN: usize = 300;
pub const BADGE_COUNT: usize = 8;

// Party
pub const PARTY_CAPACITY: usize = 6;

// PC storage (sections 5-13 concatenated)
pub const BOX_COUNT: usize = 14;
pub const BOX_CAPACITY: usize = 30;
pub const STORAGE_CURRENT_BOX_OFFSET: usize = 0x0;
pub const STORAGE_BOXES_OFFSET: usize = 0x4;
pub const STORAGE_BOX_NAMES_OFFSET: usize = 0x8344;
pub const BOX_NAME_LEN: usize = 9;
pub const STORAGE_WALLPAPERS_OFFSET: usize = 0x83C2;
