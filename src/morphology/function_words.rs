use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    /// Closed set of Russian prepositions, conjunctions, particles and interjections
    static ref FUNCTION_WORDS: HashSet<&'static str> = {
        let prepositions: &[&str] = &[
            "без", "безо", "в", "во", "для", "до", "за", "из", "изо", "из-за", "из-под", "к",
            "ко", "между", "на", "над", "надо", "о", "об", "обо", "от", "ото", "перед", "передо",
            "по", "под", "подо", "при", "про", "ради", "с", "со", "сквозь", "среди", "у", "через",
            "около", "вокруг", "возле", "после", "кроме", "вместо", "внутри", "вне", "против",
            "вдоль", "мимо", "сквозь", "благодаря", "согласно", "вопреки", "навстречу",
        ];
        let conjunctions: &[&str] = &[
            "и", "а", "но", "или", "либо", "да", "что", "чтобы", "чтоб", "если", "как", "когда",
            "пока", "хотя", "хоть", "зато", "однако", "тоже", "также", "будто", "словно", "ибо",
            "потому", "поэтому", "причем", "притом", "тогда", "нежели", "ежели", "раз", "коли",
        ];
        let particles: &[&str] = &[
            "не", "ни", "бы", "б", "ли", "ль", "же", "ж", "вот", "вон", "даже", "лишь", "только",
            "ведь", "уж", "уже", "разве", "неужели", "пусть", "пускай", "давай", "именно",
            "почти", "просто", "то", "таки", "нибудь", "либо",
        ];
        let interjections: &[&str] = &[
            "ах", "ох", "эх", "ой", "ай", "ух", "увы", "ура", "ого", "эй", "ну", "ага", "угу",
            "ха", "хм", "тьфу", "фу", "ба", "браво", "алло",
        ];

        prepositions
            .iter()
            .chain(conjunctions)
            .chain(particles)
            .chain(interjections)
            .copied()
            .collect()
    };
}

/// Returns true if the token is a service part of speech and carries no lemma
pub fn is_function_word(token: &str) -> bool {
    FUNCTION_WORDS.contains(token)
}
