use serde::Serializer;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Number;

/// One row of a league-v4 leaderboard.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntry {
    pub summoner_id: Option<String>,
    pub puuid: Option<String>,
    #[serde(alias = "summonerName")]
    pub riot_id_game_name: Option<String>,
}

impl PlayerEntry {
    pub fn display_name(&self) -> &str {
        self.riot_id_game_name.as_deref().unwrap_or("Unknown")
    }
}

#[derive(Default, Debug, Deserialize)]
pub struct LeagueList {
    #[serde(default)]
    pub entries: Vec<PlayerEntry>,
}

#[derive(Default, Debug, Deserialize)]
pub struct Summoner {
    pub puuid: Option<String>,
}

// Match-v5 payload. Non-optional fields are the structure a match cannot be
// recorded without; everything else degrades to None or zero.

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchRecord {
    pub metadata: Metadata,
    pub info: Info,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub match_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub game_duration: i64,
    pub game_mode: Option<String>,
    pub game_version: Option<String>,
    pub map_id: Option<i64>,
    pub game_ended_in_early_surrender: Option<bool>,
    pub game_ended_in_surrender: Option<bool>,
    pub teams: Vec<Team>,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub team_id: i64,
    pub objectives: Option<Objectives>,
    pub feats: Option<Feats>,
}

#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objectives {
    pub baron: Option<Objective>,
    pub dragon: Option<Objective>,
    pub inhibitor: Option<Objective>,
    pub rift_herald: Option<Objective>,
    pub champion: Option<Objective>,
    pub atakhan: Option<Objective>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Objective {
    pub first: Option<bool>,
    pub kills: Option<i64>,
}

#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
pub struct Feats {
    #[serde(rename = "EPIC_MONSTER_KILL")]
    pub epic_monster_kill: Option<Feat>,
    #[serde(rename = "FIRST_BLOOD")]
    pub first_blood: Option<Feat>,
    #[serde(rename = "FIRST_TURRET")]
    pub first_turret: Option<Feat>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feat {
    pub feat_state: Option<i64>,
}

#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub team_id: i64,
    pub participant_id: i64,
    pub puuid: Option<String>,
    pub riot_id_game_name: Option<String>,
    pub summoner_level: Option<i64>,
    pub champion_name: Option<String>,
    pub team_position: Option<String>,
    pub role: Option<String>,
    pub win: Option<bool>,
    pub game_ended_in_early_surrender: Option<bool>,
    pub game_ended_in_surrender: Option<bool>,
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
    pub assists: Option<i64>,
    pub first_blood_kill: Option<bool>,
    pub consumables_purchased: Option<i64>,
    pub damage_dealt_to_objectives: Option<i64>,
    pub damage_self_mitigated: Option<i64>,
    pub total_damage_taken: Option<i64>,
    pub total_damage_dealt_to_champions: Option<i64>,
    pub champ_experience: Option<i64>,
    pub gold_earned: Option<i64>,
    pub gold_spent: Option<i64>,
    pub vision_score: Option<i64>,
    pub sight_wards_bought_in_game: Option<i64>,
    pub wards_placed: Option<i64>,
    pub wards_killed: Option<i64>,
    pub detector_wards_placed: Option<i64>,
    pub neutral_minions_killed: Option<i64>,
    pub total_minions_killed: Option<i64>,
    pub total_ally_jungle_minions_killed: Option<i64>,
    pub total_enemy_jungle_minions_killed: Option<i64>,
    pub spell1_casts: Option<i64>,
    pub spell2_casts: Option<i64>,
    pub spell3_casts: Option<i64>,
    pub spell4_casts: Option<i64>,
    pub item0: Option<i64>,
    pub item1: Option<i64>,
    pub item2: Option<i64>,
    pub item3: Option<i64>,
    pub item4: Option<i64>,
    pub item5: Option<i64>,
    pub item6: Option<i64>,
    pub items_purchased: Option<i64>,
    pub summoner1_id: Option<i64>,
    pub summoner1_casts: Option<i64>,
    pub summoner2_id: Option<i64>,
    pub summoner2_casts: Option<i64>,
    pub basic_pings: Option<i64>,
    pub all_in_pings: Option<i64>,
    pub assist_me_pings: Option<i64>,
    pub command_pings: Option<i64>,
    pub enemy_missing_pings: Option<i64>,
    pub enemy_vision_pings: Option<i64>,
    pub hold_pings: Option<i64>,
    pub get_back_pings: Option<i64>,
    pub need_vision_pings: Option<i64>,
    pub on_my_way_pings: Option<i64>,
    pub push_pings: Option<i64>,
    pub vision_cleared_pings: Option<i64>,
    pub objectives_stolen: Option<i64>,
    pub first_tower_kill: Option<bool>,
    pub first_tower_assist: Option<bool>,
    pub turret_kills: Option<i64>,
    pub turret_takedowns: Option<i64>,
    pub dragon_kills: Option<i64>,
    pub challenges: Option<Challenges>,
}

/// Challenge counters mix integers and floats upstream, so they are kept as
/// JSON numbers and written back out unchanged.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenges {
    pub solo_kills: Option<Number>,
    pub damage_per_minute: Option<Number>,
    pub vision_score_advantage_lane_opponent: Option<Number>,
    pub vision_score_per_minute: Option<Number>,
    pub stealth_wards_placed: Option<Number>,
    pub control_wards_placed: Option<Number>,
    pub lane_minions_first10_minutes: Option<Number>,
    pub jungle_cs_before10_minutes: Option<Number>,
    pub first_turret_killed_time: Option<Number>,
    pub turret_plates_taken: Option<Number>,
    pub max_level_lead_lane_opponent: Option<Number>,
    pub max_cs_advantage_on_lane_opponent: Option<Number>,
    pub max_kill_deficit: Option<Number>,
    pub fist_bump_participation: Option<Number>,
    pub team_elder_dragon_kills: Option<Number>,
    pub ability_uses: Option<Number>,
    pub had_open_nexus: Option<Number>,
    #[serde(rename = "wardTakedownsBefore20M")]
    pub ward_takedowns_before20_m: Option<Number>,
}

/// Objective and feat counters for one team, repeated on every row of that
/// team.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamAggregate {
    pub baron_first: bool,
    pub baron_kills: i64,
    pub dragon_first: bool,
    pub inhibitor_first: bool,
    pub inhibitor_kills: i64,
    pub rift_herald_kills: i64,
    pub champion_kills: i64,
    pub atakhan_kills: i64,
    pub epic_monster_kill: i64,
    pub first_blood: i64,
    pub first_turret: i64,
}

/// One CSV line. Field declaration order is the column order; `None` is
/// written as an empty cell.
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStatRow {
    pub match_id: String,
    pub game_duration: i64,
    pub game_mode: Option<String>,
    pub game_version: Option<String>,
    pub map_id: Option<i64>,
    #[serde(serialize_with = "flag_opt")]
    pub game_ended_in_early_surrender: Option<bool>,
    #[serde(serialize_with = "flag_opt")]
    pub game_ended_in_surrender: Option<bool>,
    pub team_id: i64,
    #[serde(serialize_with = "flag_opt")]
    pub win: Option<bool>,
    pub champion_kills: i64,
    pub participant_id: i64,
    pub puuid: Option<String>,
    pub riot_id_game_name: Option<String>,
    pub summoner_level: Option<i64>,
    pub champion_name: Option<String>,
    pub role: Option<String>,
    pub team_position: Option<String>,
    pub champ_experience: Option<i64>,
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
    pub assists: Option<i64>,
    pub solo_kills: Option<Number>,
    #[serde(serialize_with = "flag_opt")]
    pub first_blood_kill: Option<bool>,
    pub consumables_purchased: Option<i64>,
    pub damage_dealt_to_objectives: Option<i64>,
    pub damage_self_mitigated: Option<i64>,
    pub total_damage_taken: Option<i64>,
    #[serde(serialize_with = "flag_opt")]
    pub first_tower_kill: Option<bool>,
    #[serde(serialize_with = "flag_opt")]
    pub first_tower_assist: Option<bool>,
    pub turret_kills: Option<i64>,
    pub turret_takedowns: Option<i64>,
    pub turret_plates_taken: Option<Number>,
    pub first_turret_killed_time: Option<Number>,
    pub total_damage_dealt_to_champions: Option<i64>,
    pub damage_per_minute: Option<Number>,
    pub gold_earned: Option<i64>,
    pub gold_spent: Option<i64>,
    pub vision_score: Option<i64>,
    pub sight_wards_bought_in_game: Option<i64>,
    pub wards_placed: Option<i64>,
    pub stealth_wards_placed: Option<Number>,
    pub control_wards_placed: Option<Number>,
    pub wards_killed: Option<i64>,
    pub detector_wards_placed: Option<i64>,
    pub vision_score_per_minute: Option<Number>,
    #[serde(rename = "wardTakedownsBefore20M")]
    pub ward_takedowns_before20_m: Option<Number>,
    pub vision_score_advantage_lane_opponent: Option<Number>,
    pub neutral_minions_killed: Option<i64>,
    pub total_minions_killed: Option<i64>,
    pub total_ally_jungle_minions_killed: Option<i64>,
    pub total_enemy_jungle_minions_killed: Option<i64>,
    pub lane_minions_first10_minutes: Option<Number>,
    pub jungle_cs_before10_minutes: Option<Number>,
    pub max_level_lead_lane_opponent: Option<Number>,
    pub max_cs_advantage_on_lane_opponent: Option<Number>,
    pub spell1_casts: Option<i64>,
    pub spell2_casts: Option<i64>,
    pub spell3_casts: Option<i64>,
    pub spell4_casts: Option<i64>,
    pub ability_uses: Option<Number>,
    pub summoner1_id: Option<i64>,
    pub summoner1_casts: Option<i64>,
    pub summoner2_id: Option<i64>,
    pub summoner2_casts: Option<i64>,
    pub item0: Option<i64>,
    pub item1: Option<i64>,
    pub item2: Option<i64>,
    pub item3: Option<i64>,
    pub item4: Option<i64>,
    pub item5: Option<i64>,
    pub item6: Option<i64>,
    pub items_purchased: Option<i64>,
    pub basic_pings: Option<i64>,
    pub all_in_pings: Option<i64>,
    pub assist_me_pings: Option<i64>,
    pub command_pings: Option<i64>,
    pub enemy_missing_pings: Option<i64>,
    pub enemy_vision_pings: Option<i64>,
    pub hold_pings: Option<i64>,
    pub get_back_pings: Option<i64>,
    pub need_vision_pings: Option<i64>,
    pub on_my_way_pings: Option<i64>,
    pub push_pings: Option<i64>,
    pub vision_cleared_pings: Option<i64>,
    pub fist_bump_participation: Option<Number>,
    pub objectives_stolen: Option<i64>,
    #[serde(serialize_with = "flag")]
    pub baron_first: bool,
    #[serde(serialize_with = "flag")]
    pub inhibitor_first: bool,
    #[serde(serialize_with = "flag")]
    pub dragon_first: bool,
    pub baron_kills: i64,
    pub inhibitor_kills: i64,
    pub dragon_kills: Option<i64>,
    pub rift_herald_kills: i64,
    pub atakhan_kills: i64,
    pub epic_monster_kill: i64,
    pub first_blood: i64,
    pub first_turret: i64,
    pub max_kill_deficit: Option<Number>,
    pub team_elder_dragon_kills: Option<Number>,
    pub had_open_nexus: Option<Number>,
}

// Flags are spelled `True`/`False`, matching stats files already on disk.
fn flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "True" } else { "False" })
}

fn flag_opt<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => flag(v, serializer),
        None => serializer.serialize_none(),
    }
}

/// CSV header, in the same order as the fields of [`ParticipantStatRow`].
pub const COLUMNS: &[&str] = &[
    "matchId",
    "gameDuration",
    "gameMode",
    "gameVersion",
    "mapId",
    "gameEndedInEarlySurrender",
    "gameEndedInSurrender",
    "teamId",
    "win",
    "championKills",
    "participantId",
    "puuid",
    "riotIdGameName",
    "summonerLevel",
    "championName",
    "role",
    "teamPosition",
    "champExperience",
    "kills",
    "deaths",
    "assists",
    "soloKills",
    "firstBloodKill",
    "consumablesPurchased",
    "damageDealtToObjectives",
    "damageSelfMitigated",
    "totalDamageTaken",
    "firstTowerKill",
    "firstTowerAssist",
    "turretKills",
    "turretTakedowns",
    "turretPlatesTaken",
    "firstTurretKilledTime",
    "totalDamageDealtToChampions",
    "damagePerMinute",
    "goldEarned",
    "goldSpent",
    "visionScore",
    "sightWardsBoughtInGame",
    "wardsPlaced",
    "stealthWardsPlaced",
    "controlWardsPlaced",
    "wardsKilled",
    "detectorWardsPlaced",
    "visionScorePerMinute",
    "wardTakedownsBefore20M",
    "visionScoreAdvantageLaneOpponent",
    "neutralMinionsKilled",
    "totalMinionsKilled",
    "totalAllyJungleMinionsKilled",
    "totalEnemyJungleMinionsKilled",
    "laneMinionsFirst10Minutes",
    "jungleCsBefore10Minutes",
    "maxLevelLeadLaneOpponent",
    "maxCsAdvantageOnLaneOpponent",
    "spell1Casts",
    "spell2Casts",
    "spell3Casts",
    "spell4Casts",
    "abilityUses",
    "summoner1Id",
    "summoner1Casts",
    "summoner2Id",
    "summoner2Casts",
    "item0",
    "item1",
    "item2",
    "item3",
    "item4",
    "item5",
    "item6",
    "itemsPurchased",
    "basicPings",
    "allInPings",
    "assistMePings",
    "commandPings",
    "enemyMissingPings",
    "enemyVisionPings",
    "holdPings",
    "getBackPings",
    "needVisionPings",
    "onMyWayPings",
    "pushPings",
    "visionClearedPings",
    "fistBumpParticipation",
    "objectivesStolen",
    "baronFirst",
    "inhibitorFirst",
    "dragonFirst",
    "baronKills",
    "inhibitorKills",
    "dragonKills",
    "riftHeraldKills",
    "atakhanKills",
    "epicMonsterKill",
    "firstBlood",
    "firstTurret",
    "maxKillDeficit",
    "teamElderDragonKills",
    "hadOpenNexus",
];
