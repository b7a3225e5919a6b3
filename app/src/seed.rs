//! Demo data seeding.

use crate::repo::{Repo, RepoError};
use crate::types::{
    Category, DEPOSIT_PER_PERSON, EventStatus, Level, NewEvent, UserId, Yen,
};
use chrono::{DateTime, Duration, Utc};

struct DemoEvent {
    title: &'static str,
    category: Category,
    description: &'static str,
    location_name: &'static str,
    location_area: &'static str,
    price: u64,
    capacity: u32,
    current_count: u32,
    level: Level,
    tags: &'static [&'static str],
    image_url: &'static str,
}

const DEMO_EVENTS: [DemoEvent; 4] = [
    DemoEvent {
        title: "真冬のテントサウナ体験会!",
        category: Category::Outdoor,
        description: "氷点下の湖畔で整いたい方募集。薪割りから火おこしまで一緒にやりましょう!",
        location_name: "本栖湖キャンプ場",
        location_area: "山梨県",
        price: 2500,
        capacity: 6,
        current_count: 2,
        level: Level::BeginnerWelcome,
        tags: &["サウナ", "キャンプ", "冬キャンプ"],
        image_url: "https://images.unsplash.com/photo-1596435707700-032f2ec2084c?w=1200&q=80",
    },
    DemoEvent {
        title: "モルック日本代表(自称)との練習試合",
        category: Category::Sports,
        description: "週末にゆったりモルックしましょう。初心者でもその場で教えます!",
        location_name: "代々木公園 中央広場",
        location_area: "東京都",
        price: 500,
        capacity: 12,
        current_count: 4,
        level: Level::BeginnerWelcome,
        tags: &["モルック", "公園", "マイナースポーツ"],
        image_url: "https://images.unsplash.com/photo-1626027552271-e970a09e05ce?w=1200&q=80",
    },
    DemoEvent {
        title: "【電子工作】自作自立時計を作ろう",
        category: Category::Monozukuri,
        description: "Raspberry Pi Picoを使って、自分好みのデジタル時計を作ります。ハンダ付け不要!",
        location_name: "秋葉原DMM.make AKIBA",
        location_area: "東京都",
        price: 5000,
        capacity: 4,
        current_count: 1,
        level: Level::Experienced,
        tags: &["テック", "DIY", "電子工作"],
        image_url: "https://images.unsplash.com/photo-1518770660439-4636190af475?w=1200&q=80",
    },
    DemoEvent {
        title: "ボードゲーム「テラフォーミング・マーズ」",
        category: Category::Boardgame,
        description: "火星開拓をじっくりやりたい方。拡張版(プレリュード)込みで遊びます。",
        location_name: "新宿 ボドゲカフェ",
        location_area: "東京都",
        price: 1500,
        capacity: 5,
        current_count: 3,
        level: Level::Experienced,
        tags: &["ボドゲ", "重ゲー", "火星"],
        image_url: "https://images.unsplash.com/photo-1610819013583-6997842a6288?w=1200&q=80",
    },
];

/// The demo events, scheduled relative to `now`: start tomorrow, run three
/// hours, deadline twelve hours before the start.
#[must_use]
pub fn demo_events(now: DateTime<Utc>) -> Vec<NewEvent> {
    let start = now + Duration::hours(24);
    let end = start + Duration::hours(3);
    let deadline = start - Duration::hours(12);

    DEMO_EVENTS
        .iter()
        .map(|demo| NewEvent {
            title: demo.title.to_string(),
            category: demo.category,
            description: demo.description.to_string(),
            start_at: start,
            end_at: end,
            deadline_at: deadline,
            location_name: demo.location_name.to_string(),
            location_area: demo.location_area.to_string(),
            capacity: demo.capacity,
            current_count: demo.current_count,
            price: Yen(demo.price),
            deposit: DEPOSIT_PER_PERSON,
            status: EventStatus::Recruiting,
            tags: demo.tags.iter().map(ToString::to_string).collect(),
            image_url: Some(demo.image_url.to_string()),
            level: demo.level,
            host_id: UserId::new("demo_host_system"),
            host_name: "MONOs System".to_string(),
            host_photo: None,
        })
        .collect()
}

/// Persist the demo events.
///
/// # Errors
///
/// Returns the first [`RepoError`] a write fails with.
pub async fn seed(repo: &Repo, now: DateTime<Utc>) -> Result<(), RepoError> {
    tracing::info!("seeding demo data");
    for event in demo_events(now) {
        repo.create_event(&event).await?;
    }
    tracing::info!("seeding complete");
    Ok(())
}
