use shelterdb_core::db::{init_db, open_db_in_memory, SchemaTable};
use shelterdb_core::repo::queries::{count_rows, people_for_pet, pets_for_person, traits_for_breed};
use shelterdb_core::{
    Breed, BreedKey, BreedTrait, Person, Pet, PetKey, Session, SessionError, Species,
};
use rusqlite::Connection;

fn fresh_store() -> Connection {
    let mut conn = open_db_in_memory().unwrap();
    init_db(&mut conn).unwrap();
    conn
}

fn stage_pet(session: &mut Session<'_>, name: &str) -> (BreedKey, PetKey) {
    let dog = session.add(Species::new("Dog")).unwrap();
    let breed = session.add(Breed::new("Dalmatian", dog)).unwrap();
    let pet = session.add(Pet::new(name, breed)).unwrap();
    (breed, pet)
}

#[test]
fn setting_people_on_a_pet_is_visible_from_both_sides() {
    let mut conn = fresh_store();
    let mut session = Session::new(&mut conn);
    let (_, spot) = stage_pet(&mut session, "Spot");
    let tom = session.add(Person::new("Tom", "Smith")).unwrap();
    let sue = session.add(Person::new("Sue", "Johson")).unwrap();

    session.set_pet_people(spot, &[tom, sue]).unwrap();
    assert_eq!(session.person_pets(tom).unwrap(), vec![spot]);
    assert_eq!(session.person_pets(sue).unwrap(), vec![spot]);

    let stats = session.commit().unwrap();
    assert_eq!(stats.links_added, 2);
    assert_eq!(session.pet_people(spot).unwrap(), vec![tom, sue]);

    let spot_id = session.id(spot).unwrap().unwrap();
    let tom_id = session.id(tom).unwrap().unwrap();
    let sue_id = session.id(sue).unwrap().unwrap();
    let stored_people: Vec<i64> = people_for_pet(session.connection(), spot_id)
        .unwrap()
        .into_iter()
        .map(|person| person.id)
        .collect();
    assert_eq!(stored_people, vec![sue_id, tom_id]);
    for person_id in [tom_id, sue_id] {
        let pets = pets_for_person(session.connection(), person_id).unwrap();
        assert_eq!(pets.len(), 1);
        assert_eq!(pets[0].name, "Spot");
    }
}

#[test]
fn unlinking_deletes_exactly_one_join_row_and_updates_the_inverse_view() {
    let mut conn = fresh_store();
    let mut session = Session::new(&mut conn);
    let (_, spot) = stage_pet(&mut session, "Spot");
    let tom = session.add(Person::new("Tom", "Smith")).unwrap();
    let sue = session.add(Person::new("Sue", "Johson")).unwrap();
    session.set_pet_people(spot, &[tom, sue]).unwrap();
    session.commit().unwrap();
    assert!(session.pet_people(spot).unwrap().contains(&tom));
    assert_eq!(count_rows(session.connection(), SchemaTable::PetPerson).unwrap(), 2);

    assert!(session.unlink_pet_person(spot, tom).unwrap());
    assert!(!session.person_pets(tom).unwrap().contains(&spot));
    assert_eq!(session.pet_people(spot).unwrap(), vec![sue]);

    let stats = session.commit().unwrap();
    assert_eq!(stats.links_removed, 1);
    assert_eq!(stats.links_added, 0);
    assert_eq!(count_rows(session.connection(), SchemaTable::PetPerson).unwrap(), 1);

    let tom_id = session.id(tom).unwrap().unwrap();
    assert!(pets_for_person(session.connection(), tom_id).unwrap().is_empty());
}

#[test]
fn linking_twice_writes_a_single_join_row() {
    let mut conn = fresh_store();
    let mut session = Session::new(&mut conn);
    let (_, spot) = stage_pet(&mut session, "Spot");
    let tom = session.add(Person::new("Tom", "Smith")).unwrap();

    assert!(session.link_pet_person(spot, tom).unwrap());
    assert!(!session.link_pet_person(spot, tom).unwrap());
    session.commit().unwrap();

    assert!(!session.link_pet_person(spot, tom).unwrap());
    let stats = session.commit().unwrap();
    assert_eq!(stats.links_added, 0);
    assert_eq!(count_rows(session.connection(), SchemaTable::PetPerson).unwrap(), 1);
}

#[test]
fn link_and_unlink_before_commit_writes_nothing() {
    let mut conn = fresh_store();
    let mut session = Session::new(&mut conn);
    let (_, spot) = stage_pet(&mut session, "Spot");
    let tom = session.add(Person::new("Tom", "Smith")).unwrap();

    session.link_pet_person(spot, tom).unwrap();
    assert!(session.unlink_pet_person(spot, tom).unwrap());
    assert!(!session.unlink_pet_person(spot, tom).unwrap());

    let stats = session.commit().unwrap();
    assert_eq!(stats.links_added, 0);
    assert_eq!(stats.links_removed, 0);
    assert_eq!(count_rows(session.connection(), SchemaTable::PetPerson).unwrap(), 0);
}

#[test]
fn set_pet_people_replaces_the_whole_collection() {
    let mut conn = fresh_store();
    let mut session = Session::new(&mut conn);
    let (_, spot) = stage_pet(&mut session, "Spot");
    let tom = session.add(Person::new("Tom", "Smith")).unwrap();
    let sue = session.add(Person::new("Sue", "Johson")).unwrap();
    session.set_pet_people(spot, &[tom, sue]).unwrap();
    session.commit().unwrap();

    session.set_pet_people(spot, &[sue]).unwrap();
    assert!(session.person_pets(tom).unwrap().is_empty());
    let stats = session.commit().unwrap();
    assert_eq!(stats.links_removed, 1);
    assert_eq!(stats.links_added, 0);

    session.set_pet_people(spot, &[]).unwrap();
    session.commit().unwrap();
    assert_eq!(count_rows(session.connection(), SchemaTable::PetPerson).unwrap(), 0);
}

#[test]
fn relinking_after_a_committed_unlink_inserts_the_row_again() {
    let mut conn = fresh_store();
    let mut session = Session::new(&mut conn);
    let (_, spot) = stage_pet(&mut session, "Spot");
    let tom = session.add(Person::new("Tom", "Smith")).unwrap();

    session.link_pet_person(spot, tom).unwrap();
    session.commit().unwrap();
    session.unlink_pet_person(spot, tom).unwrap();
    session.commit().unwrap();
    session.link_pet_person(spot, tom).unwrap();
    let stats = session.commit().unwrap();

    assert_eq!(stats.links_added, 1);
    assert_eq!(count_rows(session.connection(), SchemaTable::PetPerson).unwrap(), 1);
}

#[test]
fn breed_traits_are_symmetric_and_persisted() {
    let mut conn = fresh_store();
    let mut session = Session::new(&mut conn);
    let dog = session.add(Species::new("Dog")).unwrap();
    let dalmatian = session.add(Breed::new("Dalmatian", dog)).unwrap();
    let golden = session.add(Breed::new("Golden Retriever", dog)).unwrap();
    let spotted = session.add(BreedTrait::new("Spotted")).unwrap();
    let friendly = session.add(BreedTrait::new("Friendly")).unwrap();

    session.link_breed_trait(dalmatian, spotted).unwrap();
    session.link_breed_trait(dalmatian, friendly).unwrap();
    session.link_breed_trait(golden, friendly).unwrap();
    assert_eq!(session.trait_breeds(friendly).unwrap(), vec![dalmatian, golden]);
    assert_eq!(session.breed_traits(dalmatian).unwrap(), vec![spotted, friendly]);
    session.commit().unwrap();

    let dalmatian_id = session.id(dalmatian).unwrap().unwrap();
    let names: Vec<String> = traits_for_breed(session.connection(), dalmatian_id)
        .unwrap()
        .into_iter()
        .map(|row| row.name)
        .collect();
    assert_eq!(names, vec!["Friendly".to_string(), "Spotted".to_string()]);

    assert!(session.unlink_breed_trait(golden, friendly).unwrap());
    assert_eq!(session.trait_breeds(friendly).unwrap(), vec![dalmatian]);
    session.commit().unwrap();
    assert_eq!(
        count_rows(session.connection(), SchemaTable::BreedBreedTrait).unwrap(),
        2
    );
}

#[test]
fn stored_links_can_be_removed_from_a_later_session() {
    let mut conn = fresh_store();
    let (spot_id, tom_id, sue_id) = {
        let mut session = Session::new(&mut conn);
        let (_, spot) = stage_pet(&mut session, "Spot");
        let tom = session.add(Person::new("Tom", "Smith")).unwrap();
        let sue = session.add(Person::new("Sue", "Johson")).unwrap();
        session.set_pet_people(spot, &[tom, sue]).unwrap();
        session.commit().unwrap();
        (
            session.id(spot).unwrap().unwrap(),
            session.id(tom).unwrap().unwrap(),
            session.id(sue).unwrap().unwrap(),
        )
    };

    let mut session = Session::new(&mut conn);
    let tom = session.load::<Person>(tom_id).unwrap().unwrap();
    let spot = session.load::<Pet>(spot_id).unwrap().unwrap();
    assert_eq!(session.pet_people(spot).unwrap(), vec![tom]);
    assert_eq!(session.person_pets(tom).unwrap(), vec![spot]);
    assert!(!session.has_pending_changes());

    let sue = session.load::<Person>(sue_id).unwrap().unwrap();
    assert_eq!(session.person_pets(sue).unwrap(), vec![spot]);
    assert!(!session.link_pet_person(spot, sue).unwrap());

    assert!(session.unlink_pet_person(spot, tom).unwrap());
    let stats = session.commit().unwrap();
    assert_eq!(stats.links_removed, 1);
    assert_eq!(stats.links_added, 0);
    assert!(pets_for_person(session.connection(), tom_id).unwrap().is_empty());
    assert_eq!(count_rows(session.connection(), SchemaTable::PetPerson).unwrap(), 1);
}

#[test]
fn stored_breed_traits_are_seeded_from_either_side() {
    let mut conn = fresh_store();
    let (dalmatian_id, spotted_id) = {
        let mut session = Session::new(&mut conn);
        let dog = session.add(Species::new("Dog")).unwrap();
        let dalmatian = session.add(Breed::new("Dalmatian", dog)).unwrap();
        let spotted = session.add(BreedTrait::new("Spotted")).unwrap();
        session.link_breed_trait(dalmatian, spotted).unwrap();
        session.commit().unwrap();
        (
            session.id(dalmatian).unwrap().unwrap(),
            session.id(spotted).unwrap().unwrap(),
        )
    };

    let mut session = Session::new(&mut conn);
    let spotted = session.load::<BreedTrait>(spotted_id).unwrap().unwrap();
    let dalmatian = session.load::<Breed>(dalmatian_id).unwrap().unwrap();
    assert_eq!(session.breed_traits(dalmatian).unwrap(), vec![spotted]);
    assert!(session.unlink_breed_trait(dalmatian, spotted).unwrap());
    session.commit().unwrap();
    assert_eq!(
        count_rows(session.connection(), SchemaTable::BreedBreedTrait).unwrap(),
        0
    );
}

#[test]
fn removing_a_join_row_that_vanished_fails_the_commit() {
    let mut conn = fresh_store();
    let mut session = Session::new(&mut conn);
    let (_, spot) = stage_pet(&mut session, "Spot");
    let tom = session.add(Person::new("Tom", "Smith")).unwrap();
    session.link_pet_person(spot, tom).unwrap();
    session.commit().unwrap();

    session
        .connection()
        .execute("DELETE FROM pet_person;", [])
        .unwrap();
    session.unlink_pet_person(spot, tom).unwrap();

    let err = session.commit().unwrap_err();
    assert!(matches!(
        err,
        SessionError::StaleLink {
            table: "pet_person",
            ..
        }
    ));
    assert!(session.has_pending_changes());
}
