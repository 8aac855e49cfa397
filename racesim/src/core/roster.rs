use crate::core::car::Car;
use crate::core::driver::Driver;
use crate::core::tireset::TireCompound;
use rand::Rng;
use std::sync::Arc;

/// * `color` - Hex color used by the view for car markers
#[derive(Debug, Clone)]
pub struct Team {
    pub id: usize,
    pub name: String,
    pub color: String,
}

impl Team {
    pub fn new(id: usize, name: &str, color: &str) -> Team {
        if name.trim().is_empty() {
            panic!("Team name must not be empty!")
        }
        Team {
            id,
            name: name.to_owned(),
            color: color.to_owned(),
        }
    }
}

/// The field: teams plus their cars. Cars are shared across worker threads,
/// hence the `Arc`.
#[derive(Debug, Clone)]
pub struct Roster {
    pub teams: Vec<Team>,
    pub cars: Vec<Arc<Car>>,
}

impl Roster {
    pub fn new(teams: Vec<Team>, cars: Vec<Arc<Car>>) -> Roster {
        for car in &cars {
            if car.team_id >= teams.len() {
                panic!("Car #{} references unknown team id {}!", car.car_no, car.team_id)
            }
        }
        Roster { teams, cars }
    }

    /// Both cars of a team, in roster order.
    pub fn team_cars(&self, team_id: usize) -> Vec<Arc<Car>> {
        self.cars
            .iter()
            .filter(|c| c.team_id == team_id)
            .cloned()
            .collect()
    }

    pub fn car_by_number(&self, car_no: u32) -> Option<Arc<Car>> {
        self.cars.iter().find(|c| c.car_no == car_no).cloned()
    }

    /// Pełna stawka: 10 zespołów po dwóch kierowców.
    pub fn standard() -> Roster {
        let lineup: [(&str, &str, [(&str, &str, u8); 2]); 10] = [
            ("Red Bull Racing", "#00008B", [("Max Verstappen", "VER", 98), ("Sergio Perez", "PER", 85)]),
            ("Ferrari", "#FF0000", [("Charles Leclerc", "LEC", 94), ("Carlos Sainz", "SAI", 90)]),
            ("Mercedes", "#008080", [("Lewis Hamilton", "HAM", 96), ("George Russell", "RUS", 91)]),
            ("McLaren", "#FFA500", [("Lando Norris", "NOR", 92), ("Oscar Piastri", "PIA", 88)]),
            ("Aston Martin", "#006400", [("Fernando Alonso", "ALO", 93), ("Lance Stroll", "STR", 78)]),
            ("Alpine", "#FF69B4", [("Pierre Gasly", "GAS", 84), ("Esteban Ocon", "OCO", 82)]),
            ("Williams", "#ADD8E6", [("Alexander Albon", "ALB", 83), ("Logan Sargeant", "SAR", 72)]),
            ("RB", "#191970", [("Yuki Tsunoda", "TSU", 80), ("Daniel Ricciardo", "RIC", 81)]),
            ("Stake", "#008000", [("Valtteri Bottas", "BOT", 86), ("Zhou Guanyu", "ZHO", 76)]),
            ("Haas", "#D3D3D3", [("Kevin Magnussen", "MAG", 79), ("Nico Huelkenberg", "HUL", 82)]),
        ];

        let mut teams = Vec::with_capacity(lineup.len());
        let mut cars = Vec::with_capacity(lineup.len() * 2);
        let mut car_no = 1;
        let mut rng = rand::thread_rng();

        for (team_id, (team_name, color, drivers)) in lineup.iter().enumerate() {
            teams.push(Team::new(team_id, team_name, color));
            for (name, initials, skill) in drivers {
                let compound = random_starting_compound(&mut rng);
                cars.push(Arc::new(Car::new(
                    car_no,
                    team_id,
                    Driver::new(name, initials, *skill),
                    compound,
                )));
                car_no += 1;
            }
        }

        Roster::new(teams, cars)
    }
}

/// Losowa mieszanka startowa.
pub fn random_starting_compound(rng: &mut impl Rng) -> TireCompound {
    let all = TireCompound::all();
    all[rng.gen_range(0..all.len())]
}
