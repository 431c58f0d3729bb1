//! Reciters offered by the Quran host.

use serde::Serialize;

/// A reciter and the code the Quran host keys its audio by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Qari {
    pub code: &'static str,
    pub name: &'static str,
}

/// All reciters, in the host's code order.
pub const QARIS: [Qari; 5] = [
    Qari {
        code: "01",
        name: "Abdullah Al-Juhany",
    },
    Qari {
        code: "02",
        name: "Abdul-Muhsin Al-Qasim",
    },
    Qari {
        code: "03",
        name: "Abdurrahman As-Sudais",
    },
    Qari {
        code: "04",
        name: "Ibrahim Al-Dossari",
    },
    Qari {
        code: "05",
        name: "Misyari Rasyid Al-Afasi",
    },
];

impl Qari {
    pub fn all() -> &'static [Qari] {
        &QARIS
    }

    pub fn by_code(code: &str) -> Option<Qari> {
        QARIS.iter().copied().find(|q| q.code == code)
    }
}

impl Default for Qari {
    fn default() -> Self {
        QARIS[0]
    }
}
