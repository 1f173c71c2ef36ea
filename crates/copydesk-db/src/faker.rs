// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Seeded newsroom content for `--demo` and for tests that need realistic rows.

use copydesk_app::{NewArticle, STATUS_PIPELINE};
use time::{Date, Duration};

const EDITORS: [&str; 6] = ["김하늘", "이도윤", "박서연", "최민준", "정유나", "한지호"];

const COMMENT_AUTHORS: [&str; 4] = ["데스크", "김하늘", "이도윤", "편집장"];

const TOPICS: [&str; 14] = [
    "신제품",
    "여름 캠페인",
    "인터뷰",
    "리뷰 모음",
    "출시 일정",
    "브랜드 협업",
    "사용 후기",
    "가이드",
    "트렌드",
    "이벤트",
    "비교 분석",
    "체험기",
    "뉴스레터",
    "특집",
];

const SUBJECTS: [&str; 10] = [
    "무선 이어폰",
    "전기 자전거",
    "캠핑 의자",
    "스마트 워치",
    "커피 머신",
    "러닝화",
    "노트북 거치대",
    "공기청정기",
    "필름 카메라",
    "보드게임",
];

const SOURCES: [&str; 6] = [
    "https://news.example.com/",
    "https://blog.example.org/",
    "https://press.example.net/",
    "보도자료",
    "현장 취재",
    "독자 제보",
];

const COMMENT_LINES: [&str; 8] = [
    "제목 한 번 더 다듬어 주세요.",
    "이미지 교체 필요합니다.",
    "출처 링크 확인 완료.",
    "업로드 일정 내일 오전으로.",
    "좋습니다, 추천으로 올릴게요.",
    "분량이 조금 깁니다.",
    "사실 확인 부탁드려요.",
    "썸네일 문구 수정.",
];

const REFERENCE_YEAR: i32 = 2026;

struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub author: String,
    pub body: String,
}

/// Seeded generator for demo newsroom content. Same seed, same articles.
pub struct NewsroomFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl NewsroomFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn editor(&mut self) -> String {
        self.pick(&EDITORS).to_owned()
    }

    pub fn article(&mut self) -> NewArticle {
        let subject = self.pick(&SUBJECTS);
        let topic = self.pick(&TOPICS);
        let title = format!("{subject} {topic}");

        let editor = self.rng.bool().then(|| self.editor());
        let content_source = if self.rng.int_n(4) == 0 {
            None
        } else {
            let source = self.pick(&SOURCES);
            Some(if source.starts_with("https://") {
                format!("{source}{}", 1000 + self.rng.int_n(9000))
            } else {
                source.to_owned()
            })
        };
        let memo = (self.rng.int_n(3) == 0).then(|| self.pick(&COMMENT_LINES).to_owned());
        let image_url = self
            .rng
            .bool()
            .then(|| format!("https://img.example.com/{}.jpg", self.rng.int_n(500)));

        NewArticle {
            title,
            status: self.pick(&STATUS_PIPELINE).to_owned(),
            editor,
            content_source,
            memo,
            image_url,
            created_at: self.date_in_year(REFERENCE_YEAR),
        }
    }

    pub fn comment(&mut self) -> CommentDraft {
        CommentDraft {
            author: self.pick(&COMMENT_AUTHORS).to_owned(),
            body: self.pick(&COMMENT_LINES).to_owned(),
        }
    }

    pub fn date_in_year(&mut self, year: i32) -> Date {
        let start = first_of_year(year);
        let days_in_year = if time::util::is_leap_year(year) {
            366
        } else {
            365
        };
        start + Duration::days(self.rng.int_n(days_in_year) as i64)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

pub fn editors() -> &'static [&'static str] {
    &EDITORS
}

fn first_of_year(year: i32) -> Date {
    Date::from_ordinal_date(year, 1).unwrap_or(Date::MIN)
}
