//! Stand-ins for the human seat.

use swindle_bot::ReasoningEngine;
use swindle_core::belief::BeliefMemory;
use swindle_core::game::opponent::Move;
use swindle_core::game::session::GameSession;
use swindle_core::game::table::HumanCommand;
use swindle_core::model::chance::Chance;
use swindle_core::model::side::Side;

use crate::config::ChallengerKind;

pub enum Challenger {
    Mirror {
        engine: ReasoningEngine,
        memory: BeliefMemory,
        round: u32,
    },
    Cautious,
}

impl Challenger {
    pub fn new(kind: ChallengerKind, faces: u8) -> Self {
        match kind {
            ChallengerKind::Mirror => Challenger::Mirror {
                engine: ReasoningEngine::from_env(),
                memory: BeliefMemory::new(faces),
                round: 0,
            },
            ChallengerKind::Cautious => Challenger::Cautious,
        }
    }

    pub fn kind(&self) -> ChallengerKind {
        match self {
            Challenger::Mirror { .. } => ChallengerKind::Mirror,
            Challenger::Cautious => ChallengerKind::Cautious,
        }
    }

    /// Picks the human seat's next command. Only meaningful on the human's turn.
    pub fn choose(&mut self, session: &GameSession, chance: &mut dyn Chance) -> HumanCommand {
        match self {
            Challenger::Mirror {
                engine,
                memory,
                round,
            } => {
                let number = session.round().number();
                if *round != number {
                    *round = number;
                    memory.reset();
                }
                let ctx = session.decision_context(Side::Human, memory);
                match engine.plan(ctx, chance).chosen {
                    Move::Raise { count, face } => HumanCommand::Bid { count, face },
                    Move::Call => HumanCommand::Call,
                }
            }
            Challenger::Cautious => cautious_command(session),
        }
    }
}

/// Believes its own dice plus an even share of the rival's. Calls anything
/// above that, otherwise raises the count by one on its strongest face.
fn cautious_command(session: &GameSession) -> HumanCommand {
    let own = session.pool(Side::Human);
    let rival_dice = session.pool(Side::Opponent).len();
    let faces = session.faces();
    let strongest = own.modes().first().copied().unwrap_or(1);

    let Some(standing) = session.standing() else {
        return HumanCommand::Bid {
            count: 1,
            face: strongest,
        };
    };

    let expected = own.count(standing.face) as f64 + rival_dice as f64 / f64::from(faces);
    if f64::from(standing.count) > expected {
        return HumanCommand::Call;
    }

    let next = usize::from(standing.count) + 1;
    if next > session.dice_on_table() {
        return HumanCommand::Call;
    }
    HumanCommand::Bid {
        count: standing.count + 1,
        face: strongest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use swindle_core::model::config::GameConfig;
    use swindle_core::model::dice::DicePool;

    fn session(human: Vec<u8>, opponent: Vec<u8>) -> GameSession {
        GameSession::from_pools(
            GameConfig::default(),
            DicePool::with_dice(human),
            DicePool::with_dice(opponent),
            Side::Human,
        )
    }

    #[test]
    fn cautious_opens_with_its_strongest_face() {
        let session = session(vec![1, 3, 3, 4, 4], vec![1, 1, 1, 1, 1]);
        assert_eq!(
            cautious_command(&session),
            HumanCommand::Bid { count: 1, face: 3 }
        );
    }

    #[test]
    fn cautious_calls_above_expectation() {
        let mut session = session(vec![2, 3, 3, 4, 4], vec![1, 1, 1, 1, 1]);
        session.submit_bid(Side::Human, 1, 1).expect("open");
        session.submit_bid(Side::Opponent, 3, 2).expect("raise");
        // one two held, 5/4 expected from the rival: 2.25 < 3
        assert_eq!(cautious_command(&session), HumanCommand::Call);
    }

    #[test]
    fn cautious_raises_within_expectation() {
        let mut session = session(vec![2, 2, 3, 3, 4], vec![1, 1, 1, 1, 1]);
        session.submit_bid(Side::Human, 1, 1).expect("open");
        session.submit_bid(Side::Opponent, 2, 2).expect("raise");
        assert_eq!(
            cautious_command(&session),
            HumanCommand::Bid { count: 3, face: 2 }
        );
    }

    #[test]
    fn mirror_answers_with_a_legal_command() {
        let mut session = session(vec![1, 2, 2, 3, 4], vec![1, 2, 3, 3, 4]);
        session.submit_bid(Side::Human, 1, 1).expect("open");
        session.submit_bid(Side::Opponent, 2, 3).expect("raise");
        let mut challenger = Challenger::new(ChallengerKind::Mirror, 4);
        let mut rng = StdRng::seed_from_u64(7);
        match challenger.choose(&session, &mut rng) {
            HumanCommand::Bid { count, face } => {
                assert!(count > 2 || (count == 2 && face > 3));
            }
            HumanCommand::Call => {}
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(challenger.kind(), ChallengerKind::Mirror);
    }
}
