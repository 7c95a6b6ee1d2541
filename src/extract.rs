use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{
    Challenges, MatchRecord, Objective, ParticipantStatRow, Team, TeamAggregate,
};

impl MatchRecord {
    /// Types a raw match-v5 payload. Fails only when the metadata, info, teams
    /// or participants structure is missing or unusable.
    pub fn from_value(value: &Value) -> Result<MatchRecord> {
        let match_id = value
            .pointer("/metadata/matchId")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        MatchRecord::deserialize(value)
            .with_context(|| format!("Match {} is missing mandatory structure", match_id))
    }
}

fn aggregate_team(team: &Team) -> TeamAggregate {
    let objectives = team.objectives.clone().unwrap_or_default();
    let feats = team.feats.clone().unwrap_or_default();
    let objective = |o: Option<Objective>| o.unwrap_or_default();

    TeamAggregate {
        baron_first: objective(objectives.baron).first.unwrap_or(false),
        baron_kills: objective(objectives.baron).kills.unwrap_or(0),
        dragon_first: objective(objectives.dragon).first.unwrap_or(false),
        inhibitor_first: objective(objectives.inhibitor).first.unwrap_or(false),
        inhibitor_kills: objective(objectives.inhibitor).kills.unwrap_or(0),
        rift_herald_kills: objective(objectives.rift_herald).kills.unwrap_or(0),
        champion_kills: objective(objectives.champion).kills.unwrap_or(0),
        atakhan_kills: objective(objectives.atakhan).kills.unwrap_or(0),
        epic_monster_kill: feats
            .epic_monster_kill
            .and_then(|f| f.feat_state)
            .unwrap_or(0),
        first_blood: feats.first_blood.and_then(|f| f.feat_state).unwrap_or(0),
        first_turret: feats.first_turret.and_then(|f| f.feat_state).unwrap_or(0),
    }
}

/// Flattens a match into one row per participant, in participant order.
pub fn extract(record: &MatchRecord) -> Vec<ParticipantStatRow> {
    let info = &record.info;
    let teams: HashMap<i64, TeamAggregate> = info
        .teams
        .iter()
        .map(|team| (team.team_id, aggregate_team(team)))
        .collect();

    info.participants
        .iter()
        .map(|p| {
            let team = teams.get(&p.team_id).copied().unwrap_or_default();
            let ch = p.challenges.clone().unwrap_or_default();
            let Challenges {
                solo_kills,
                damage_per_minute,
                vision_score_advantage_lane_opponent,
                vision_score_per_minute,
                stealth_wards_placed,
                control_wards_placed,
                lane_minions_first10_minutes,
                jungle_cs_before10_minutes,
                first_turret_killed_time,
                turret_plates_taken,
                max_level_lead_lane_opponent,
                max_cs_advantage_on_lane_opponent,
                max_kill_deficit,
                fist_bump_participation,
                team_elder_dragon_kills,
                ability_uses,
                had_open_nexus,
                ward_takedowns_before20_m,
            } = ch;

            ParticipantStatRow {
                match_id: record.metadata.match_id.clone(),
                game_duration: info.game_duration,
                game_mode: info.game_mode.clone(),
                game_version: info.game_version.clone(),
                map_id: info.map_id,
                game_ended_in_early_surrender: p
                    .game_ended_in_early_surrender
                    .or(info.game_ended_in_early_surrender),
                game_ended_in_surrender: p
                    .game_ended_in_surrender
                    .or(info.game_ended_in_surrender),
                team_id: p.team_id,
                win: p.win,
                champion_kills: team.champion_kills,
                participant_id: p.participant_id,
                puuid: p.puuid.clone(),
                riot_id_game_name: p.riot_id_game_name.clone(),
                summoner_level: p.summoner_level,
                champion_name: p.champion_name.clone(),
                role: p.role.clone(),
                team_position: p.team_position.clone(),
                champ_experience: p.champ_experience,
                kills: p.kills,
                deaths: p.deaths,
                assists: p.assists,
                solo_kills,
                first_blood_kill: p.first_blood_kill,
                consumables_purchased: p.consumables_purchased,
                damage_dealt_to_objectives: p.damage_dealt_to_objectives,
                damage_self_mitigated: p.damage_self_mitigated,
                total_damage_taken: p.total_damage_taken,
                first_tower_kill: p.first_tower_kill,
                first_tower_assist: p.first_tower_assist,
                turret_kills: p.turret_kills,
                turret_takedowns: p.turret_takedowns,
                turret_plates_taken,
                first_turret_killed_time,
                total_damage_dealt_to_champions: p.total_damage_dealt_to_champions,
                damage_per_minute,
                gold_earned: p.gold_earned,
                gold_spent: p.gold_spent,
                vision_score: p.vision_score,
                sight_wards_bought_in_game: p.sight_wards_bought_in_game,
                wards_placed: p.wards_placed,
                stealth_wards_placed,
                control_wards_placed,
                wards_killed: p.wards_killed,
                detector_wards_placed: p.detector_wards_placed,
                vision_score_per_minute,
                ward_takedowns_before20_m,
                vision_score_advantage_lane_opponent,
                neutral_minions_killed: p.neutral_minions_killed,
                total_minions_killed: p.total_minions_killed,
                total_ally_jungle_minions_killed: p.total_ally_jungle_minions_killed,
                total_enemy_jungle_minions_killed: p.total_enemy_jungle_minions_killed,
                lane_minions_first10_minutes,
                jungle_cs_before10_minutes,
                max_level_lead_lane_opponent,
                max_cs_advantage_on_lane_opponent,
                spell1_casts: p.spell1_casts,
                spell2_casts: p.spell2_casts,
                spell3_casts: p.spell3_casts,
                spell4_casts: p.spell4_casts,
                ability_uses,
                summoner1_id: p.summoner1_id,
                summoner1_casts: p.summoner1_casts,
                summoner2_id: p.summoner2_id,
                summoner2_casts: p.summoner2_casts,
                item0: p.item0,
                item1: p.item1,
                item2: p.item2,
                item3: p.item3,
                item4: p.item4,
                item5: p.item5,
                item6: p.item6,
                items_purchased: p.items_purchased,
                basic_pings: p.basic_pings,
                all_in_pings: p.all_in_pings,
                assist_me_pings: p.assist_me_pings,
                command_pings: p.command_pings,
                enemy_missing_pings: p.enemy_missing_pings,
                enemy_vision_pings: p.enemy_vision_pings,
                hold_pings: p.hold_pings,
                get_back_pings: p.get_back_pings,
                need_vision_pings: p.need_vision_pings,
                on_my_way_pings: p.on_my_way_pings,
                push_pings: p.push_pings,
                vision_cleared_pings: p.vision_cleared_pings,
                fist_bump_participation,
                objectives_stolen: p.objectives_stolen,
                baron_first: team.baron_first,
                inhibitor_first: team.inhibitor_first,
                dragon_first: team.dragon_first,
                baron_kills: team.baron_kills,
                inhibitor_kills: team.inhibitor_kills,
                dragon_kills: p.dragon_kills,
                rift_herald_kills: team.rift_herald_kills,
                atakhan_kills: team.atakhan_kills,
                epic_monster_kill: team.epic_monster_kill,
                first_blood: team.first_blood,
                first_turret: team.first_turret,
                max_kill_deficit,
                team_elder_dragon_kills,
                had_open_nexus,
            }
        })
        .collect()
}

/// Types and flattens a raw payload in one step.
pub fn extract_value(value: &Value) -> Result<Vec<ParticipantStatRow>> {
    let record = MatchRecord::from_value(value)?;
    Ok(extract(&record))
}
