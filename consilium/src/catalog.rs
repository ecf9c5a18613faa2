//! Closed catalog of medical specialties and the council model assigned to each.

/// Model label used when a specialty is not in the catalog.
pub const FALLBACK_MODEL: &str = "Gemini";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Specialty {
    pub name: &'static str,
    pub scope: &'static str,
    pub model: &'static str,
}

pub const SPECIALTIES: [Specialty; 20] = [
    Specialty {
        name: "Cardiology",
        scope: "Heart and cardiovascular diseases, chest pain, hypertension, arrhythmias",
        model: "Gemini",
    },
    Specialty {
        name: "Neurology",
        scope: "Brain, nerves, headaches, seizures, neurological conditions",
        model: "Claude",
    },
    Specialty {
        name: "Radiology",
        scope: "Medical imaging interpretation, X-rays, CT scans, MRIs, ultrasound",
        model: "GPT",
    },
    Specialty {
        name: "Oncology",
        scope: "Cancer, tumors, malignancies, cancer diagnosis and treatment",
        model: "Llama",
    },
    Specialty {
        name: "Endocrinology",
        scope: "Hormones, diabetes, thyroid disorders, metabolic conditions",
        model: "Grok",
    },
    Specialty {
        name: "Gastroenterology",
        scope: "Digestive system, liver, stomach, intestines",
        model: "Gemini",
    },
    Specialty {
        name: "Pulmonology",
        scope: "Lungs, respiratory system, breathing disorders",
        model: "GPT",
    },
    Specialty {
        name: "Nephrology",
        scope: "Kidneys, renal diseases, dialysis",
        model: "Gemini",
    },
    Specialty {
        name: "Rheumatology",
        scope: "Joints, autoimmune diseases, arthritis",
        model: "Claude",
    },
    Specialty {
        name: "Infectious Disease",
        scope: "Infections, bacterial and viral diseases, antibiotics",
        model: "Llama",
    },
    Specialty {
        name: "Hematology",
        scope: "Blood disorders, anemia, clotting problems",
        model: "Llama",
    },
    Specialty {
        name: "Geriatrics",
        scope: "Elderly care, age-related conditions",
        model: "Gemini",
    },
    Specialty {
        name: "Emergency Medicine",
        scope: "Acute care, trauma, critical conditions",
        model: "GPT",
    },
    Specialty {
        name: "Internal Medicine",
        scope: "General medicine, complex multi-system diseases",
        model: "Gemini",
    },
    Specialty {
        name: "Pediatrics",
        scope: "Children's health, pediatric conditions",
        model: "Claude",
    },
    Specialty {
        name: "Dermatology",
        scope: "Skin conditions, dermatological diseases",
        model: "GPT",
    },
    Specialty {
        name: "Orthopedics",
        scope: "Bones, joints, fractures, musculoskeletal system",
        model: "GPT",
    },
    Specialty {
        name: "Urology",
        scope: "Urinary system, kidneys, bladder",
        model: "Gemini",
    },
    Specialty {
        name: "Gynecology",
        scope: "Women's reproductive health",
        model: "Gemini",
    },
    Specialty {
        name: "Psychiatry",
        scope: "Mental health, psychological conditions",
        model: "Claude",
    },
];

/// Exact-name lookup into the catalog.
pub fn find_specialty(name: &str) -> Option<&'static Specialty> {
    SPECIALTIES.iter().find(|specialty| specialty.name == name)
}

pub fn model_for_specialty(name: &str) -> &'static str {
    find_specialty(name)
        .map(|specialty| specialty.model)
        .unwrap_or(FALLBACK_MODEL)
}

pub fn specialty_names() -> impl Iterator<Item = &'static str> {
    SPECIALTIES.iter().map(|specialty| specialty.name)
}
