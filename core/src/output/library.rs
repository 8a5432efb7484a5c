//! Shared output strings
//!
//! Directions and common callouts that every trigger set can reference by key
//! without declaring them in its own `output_strings`.

use raidwatch_types::Lang;

/// A static localized string. English is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticText {
    pub en: &'static str,
    pub de: Option<&'static str>,
    pub fr: Option<&'static str>,
    pub ja: Option<&'static str>,
    pub cn: Option<&'static str>,
    pub ko: Option<&'static str>,
}

impl StaticText {
    pub const fn new(en: &'static str) -> Self {
        Self {
            en,
            de: None,
            fr: None,
            ja: None,
            cn: None,
            ko: None,
        }
    }

    pub const fn de(mut self, text: &'static str) -> Self {
        self.de = Some(text);
        self
    }

    pub const fn fr(mut self, text: &'static str) -> Self {
        self.fr = Some(text);
        self
    }

    pub const fn ja(mut self, text: &'static str) -> Self {
        self.ja = Some(text);
        self
    }

    pub const fn cn(mut self, text: &'static str) -> Self {
        self.cn = Some(text);
        self
    }

    pub const fn ko(mut self, text: &'static str) -> Self {
        self.ko = Some(text);
        self
    }

    /// Text for `lang`, falling back to English
    pub fn get(&self, lang: Lang) -> &'static str {
        let translated = match lang {
            Lang::En => None,
            Lang::De => self.de,
            Lang::Fr => self.fr,
            Lang::Ja => self.ja,
            Lang::Cn => self.cn,
            Lang::Ko => self.ko,
        };
        translated.unwrap_or(self.en)
    }
}

/// Look up a shared string by key
pub fn get(key: &str) -> Option<&'static StaticText> {
    SHARED_OUTPUTS.get(key)
}

pub fn contains(key: &str) -> bool {
    SHARED_OUTPUTS.contains_key(key)
}

/// Keys for the eight compass directions, clockwise from north
pub const DIRECTION_KEYS: [&str; 8] =
    ["dirN", "dirNE", "dirE", "dirSE", "dirS", "dirSW", "dirW", "dirNW"];

static SHARED_OUTPUTS: phf::Map<&'static str, StaticText> = phf::phf_map! {
    // ─── Directions ─────────────────────────────────────────────────────────
    "dirN" => StaticText::new("N").de("N").fr("N").ja("北").cn("上").ko("북쪽"),
    "dirNE" => StaticText::new("NE").de("NO").fr("NE").ja("北東").cn("右上").ko("북동"),
    "dirE" => StaticText::new("E").de("O").fr("E").ja("東").cn("右").ko("동쪽"),
    "dirSE" => StaticText::new("SE").de("SO").fr("SE").ja("南東").cn("右下").ko("남동"),
    "dirS" => StaticText::new("S").de("S").fr("S").ja("南").cn("下").ko("남쪽"),
    "dirSW" => StaticText::new("SW").de("SW").fr("SO").ja("南西").cn("左下").ko("남서"),
    "dirW" => StaticText::new("W").de("W").fr("O").ja("西").cn("左").ko("서쪽"),
    "dirNW" => StaticText::new("NW").de("NW").fr("NO").ja("北西").cn("左上").ko("북서"),
    "unknown" => StaticText::new("???"),

    // ─── Positioning ────────────────────────────────────────────────────────
    "in" => StaticText::new("In").de("Rein").fr("Intérieur").ja("中へ").cn("靠近").ko("안으로"),
    "out" => StaticText::new("Out").de("Raus").fr("Extérieur").ja("外へ").cn("远离").ko("밖으로"),
    "middle" => StaticText::new("Middle").de("Mitte").fr("Milieu").ja("中央").cn("中间").ko("중앙"),
    "front" => StaticText::new("Front").de("Vorne").fr("Devant").ja("前").cn("前").ko("앞"),
    "back" => StaticText::new("Back").de("Hinten").fr("Derrière").ja("後ろ").cn("后").ko("뒤"),
    "cardinals" => StaticText::new("Cardinals").de("Kardinal").fr("Cardinaux").ja("十字").cn("正点").ko("정방향"),
    "intercards" => StaticText::new("Intercards").de("Interkardinal").fr("Intercardinal").ja("斜め").cn("斜点").ko("대각선"),
    "knockback" => StaticText::new("Knockback").de("Rückstoß").fr("Poussée").ja("ノックバック").cn("击退").ko("넉백"),
    "or" => StaticText::new(" or ").de(" oder ").fr(" ou ").ja(" / ").cn("或").ko(" 또는 "),

    // ─── Mechanics ──────────────────────────────────────────────────────────
    "spread" => StaticText::new("Spread").de("Verteilen").fr("Dispersez-vous").ja("散開").cn("分散").ko("산개"),
    "stacks" => StaticText::new("Stacks").de("Sammeln").fr("Packages").ja("頭割り").cn("分摊").ko("쉐어"),
    "stackMarker" => StaticText::new("Stack").de("Sammeln").fr("Packez-vous").ja("頭割り").cn("集合").ko("쉐어뎀"),
    "stackPartner" => StaticText::new("Stack with partner").de("Mit Partner sammeln").fr("Packez-vous avec votre partenaire").ja("ペア頭割り").cn("与搭档集合").ko("파트너와 쉐어"),
    "protean" => StaticText::new("Protean").de("Himmelsrichtungen").fr("Positions").ja("基本散開").cn("八方分散").ko("8방향 산개"),
    "lookAway" => StaticText::new("Look Away").de("Wegschauen").fr("Regardez ailleurs").ja("見ないで").cn("背对").ko("뒤돌기"),
    "aoe" => StaticText::new("aoe").de("AoE").fr("AoE").ja("AoE").cn("AOE").ko("전체 공격"),
    "bigAoe" => StaticText::new("big aoe!").de("Große AoE!").fr("Grosse AoE !").ja("強力な全体攻撃").cn("大AOE伤害！").ko("강한 전체 공격!"),
    "bleedAoe" => StaticText::new("AoE + Bleed").de("AoE + Blutung").fr("AoE + Saignement").ja("全体攻撃 + 出血").cn("AOE + 流血").ko("전체 공격 + 도트"),

    // ─── Tank busters ───────────────────────────────────────────────────────
    "tankBuster" => StaticText::new("Tank Buster").de("Tank buster").fr("Tank buster").ja("タンクバスター").cn("坦克死刑").ko("탱버"),
    "tankBusterOnYou" => StaticText::new("Tank Buster on YOU").de("Tank buster auf DIR").fr("Tank buster sur VOUS").ja("自分にタンクバスター").cn("死刑点名").ko("탱버 대상자"),
    "tankBusterOnPlayer" => StaticText::new("Tank Buster on ${player}").de("Tank buster auf ${player}").fr("Tank buster sur ${player}").ja("${player}にタンクバスター").cn("死刑 点 ${player}").ko("\"${player}\" 탱버"),
    "tankSwap" => StaticText::new("Tank Swap!").de("Tankwechsel!").fr("Tank swap !").ja("タンクスイッチ").cn("换T！").ko("탱 교대"),

    // ─── Mistake lifecycle ──────────────────────────────────────────────────
    "pull" => StaticText::new("Pull").de("Pull").fr("Pull").ja("プル").cn("开怪").ko("풀링"),
    "wipe" => StaticText::new("Party Wipe").de("Gruppe ausgelöscht").fr("Équipe anéantie").ja("ワイプ").cn("团灭").ko("전멸"),
    "died" => StaticText::new("died").de("ist gestorben").fr("est mort(e)").ja("死亡").cn("死亡").ko("사망"),
};
